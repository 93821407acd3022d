fn main() {
    // Propagate the ESP-IDF build environment only for firmware builds;
    // host test builds have no ESP-IDF toolchain to point at.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
