#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() {
    if let Err(e) = gemini_desktop_lib::run() {
        eprintln!("[gemini-desktop] fatal: {e:#}");
        std::process::exit(1);
    }
}
