#[cfg(not(target_arch = "wasm32"))]
fn main() {
    eprintln!("scroll-stage runs in the browser. Run `trunk serve` or `trunk build --release`.");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    scroll_stage::run();
}
