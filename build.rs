fn main() {
    // Propagate the ESP-IDF build environment (linker args, sdkconfig)
    // only when building for the device.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
