// Build script for gatekeeper
// The Wayland bindings are generated from protocols/*.xml by wayland-scanner
// macros at compile time; rebuild when any of them changes.

fn main() {
    println!("cargo:rerun-if-changed=protocols/ext-input-trigger-registration-v1.xml");
    println!("cargo:rerun-if-changed=protocols/ext-input-trigger-action-v1.xml");
}
