//! Discrete view presets mapped onto host view requests.

use std::fmt;
use std::str::FromStr;

use crate::error::UnknownViewCommand;

/// View parameters the host map exposes to the overlay.
pub trait MapView {
    fn tilt(&self) -> f64;
    fn heading(&self) -> f64;
    fn set_tilt(&mut self, degrees: f64);
    fn set_heading(&mut self, degrees: f64);
}

/// A single UI intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    Top,
    Tilt25,
    Tilt45,
    Tilt75,
    Horizon,
    North,
    East,
    South,
    West,
}

/// What a command asks of the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewRequest {
    Tilt(f64),
    Heading(f64),
}

impl ViewCommand {
    pub const ALL: [ViewCommand; 9] = [
        ViewCommand::Top,
        ViewCommand::Tilt25,
        ViewCommand::Tilt45,
        ViewCommand::Tilt75,
        ViewCommand::Horizon,
        ViewCommand::North,
        ViewCommand::East,
        ViewCommand::South,
        ViewCommand::West,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ViewCommand::Top => "top",
            ViewCommand::Tilt25 => "tilt25",
            ViewCommand::Tilt45 => "tilt45",
            ViewCommand::Tilt75 => "tilt75",
            ViewCommand::Horizon => "horizon",
            ViewCommand::North => "north",
            ViewCommand::East => "east",
            ViewCommand::South => "south",
            ViewCommand::West => "west",
        }
    }

    pub fn request(self) -> ViewRequest {
        match self {
            ViewCommand::Top => ViewRequest::Tilt(0.0),
            ViewCommand::Tilt25 => ViewRequest::Tilt(25.0),
            ViewCommand::Tilt45 => ViewRequest::Tilt(45.0),
            ViewCommand::Tilt75 => ViewRequest::Tilt(75.0),
            ViewCommand::Horizon => ViewRequest::Tilt(90.0),
            ViewCommand::North => ViewRequest::Heading(0.0),
            ViewCommand::East => ViewRequest::Heading(90.0),
            ViewCommand::South => ViewRequest::Heading(180.0),
            ViewCommand::West => ViewRequest::Heading(270.0),
        }
    }
}

impl fmt::Display for ViewCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewCommand {
    type Err = UnknownViewCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ViewCommand::ALL
            .into_iter()
            .find(|cmd| cmd.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownViewCommand(wanted.to_string()))
    }
}

/// Stateless bridge from commands to the host's view setters.
pub struct ViewControlAdapter;

impl ViewControlAdapter {
    pub fn apply(command: ViewCommand, view: &mut dyn MapView) -> ViewRequest {
        let request = command.request();
        match request {
            ViewRequest::Tilt(degrees) => view.set_tilt(degrees),
            ViewRequest::Heading(degrees) => view.set_heading(degrees),
        }
        tracing::info!("View command {} -> {:?}", command, request);
        request
    }
}
