//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements    | Connects to                          |
//! |------------|---------------|--------------------------------------|
//! | `hardware` | ActuatorPort  | IR LEDs, ring light, stirrer drivers |
//! | `linux`    | (bindings)    | `/dev/i2c-*`, Raspberry Pi GPIO      |
//! | `sim`      | SensorPort    | Simulated rig                        |
//! |            | ActuatorPort  | In-memory actuator state             |
//! | `csv_sink` | RecordSink    | CSV file                             |
//! | `plot`     | DisplayPort   | SVG file                             |
//! | `log_sink` | EventSink     | `log` output                         |
//! | `time`     | Clock         | Monotonic clock / simulated time     |
//! | `console`  | (commands)    | stdin                                |

pub mod console;
pub mod csv_sink;
pub mod hardware;
#[cfg(feature = "linux")]
pub mod linux;
pub mod log_sink;
#[cfg(feature = "plot")]
pub mod plot;
pub mod sim;
pub mod time;
