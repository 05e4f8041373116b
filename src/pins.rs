//! GPIO pin assignments for the rangefinder board.
//!
//! Single source of truth for pin numbers.  The raw-sys echo setup uses
//! these directly; the trigger pin is taken from `esp_idf_hal` by name in
//! `main`, which checks at compile time that it matches `TRIGGER_GPIO`.

// ---------------------------------------------------------------------------
// Ultrasonic sensor (HC-SR04 or compatible)
// ---------------------------------------------------------------------------

/// Digital output: a 10 µs HIGH pulse starts a ranging cycle.
pub const TRIGGER_GPIO: i32 = 15;

/// Digital input: HIGH for the round-trip time of the sound burst.
/// Interrupt on any edge.
pub const ECHO_GPIO: i32 = 14;
