fn main() {
    // With the `accelerate` feature on macOS, LAPACK comes from Apple's
    // Accelerate framework instead of OpenBLAS.
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_ACCELERATE");
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "macos" && std::env::var_os("CARGO_FEATURE_ACCELERATE").is_some() {
        println!("cargo:rustc-link-lib=framework=Accelerate");
    }
}
