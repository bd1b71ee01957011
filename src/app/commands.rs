//! Inbound commands.
//!
//! [`ActuatorCommand`]s travel from the ring-light scheduler and the console
//! to the sampling thread, which is the only owner of the actuators.
//! [`RingControl`]s travel from the console to the scheduler.

use core::fmt;

/// Ring light colour, 0–255 per channel.
pub type Rgb = (u8, u8, u8);

pub const RGB_OFF: Rgb = (0, 0, 0);
pub const RGB_WHITE: Rgb = (255, 255, 255);

/// A request to change actuator state, applied by the sampling thread
/// during its settle and pause waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    RingLight(Rgb),
    /// Stirrer duty, 0–100 %.
    Stirrer(u8),
}

/// Control messages for the ring-light scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingControl {
    /// Hold this colour until [`RingControl::Resume`].
    Override(Rgb),
    /// Drop the override and go back to the schedule.
    Resume,
}

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Ring(RingControl),
    Stir(u8),
}

/// Why a console line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandParseError(pub &'static str);

impl fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for CommandParseError {}

/// Parse one console line.
///
/// ```text
/// ring R G B    hold the ring light at (R, G, B)
/// ring auto     resume the schedule
/// stir DUTY     stirrer duty in percent
/// ```
pub fn parse_console_line(line: &str) -> Result<ConsoleCommand, CommandParseError> {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("ring") => {
            let args: Vec<&str> = words.collect();
            match args.as_slice() {
                ["auto"] => Ok(ConsoleCommand::Ring(RingControl::Resume)),
                [r, g, b] => {
                    let channel = |s: &str| {
                        s.parse::<u8>()
                            .map_err(|_| CommandParseError("ring channels must be 0-255"))
                    };
                    Ok(ConsoleCommand::Ring(RingControl::Override((
                        channel(r)?,
                        channel(g)?,
                        channel(b)?,
                    ))))
                }
                _ => Err(CommandParseError("usage: ring R G B | ring auto")),
            }
        }
        Some("stir") => {
            let duty = words
                .next()
                .and_then(|s| s.parse::<u8>().ok())
                .filter(|d| *d <= 100)
                .ok_or(CommandParseError("usage: stir DUTY (0-100)"))?;
            if words.next().is_some() {
                return Err(CommandParseError("usage: stir DUTY (0-100)"));
            }
            Ok(ConsoleCommand::Stir(duty))
        }
        Some(_) => Err(CommandParseError("unknown command (try: ring, stir)")),
        None => Err(CommandParseError("empty line")),
    }
}
