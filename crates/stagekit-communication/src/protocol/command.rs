//! Stage controller command builders
//!
//! Every command is an ASCII line `<OP> [<KEY>=<VALUE> ...]`. Builders exist
//! per opcode so the numeric formatting of each argument is fixed in one
//! place: positions, step sizes and exposure use four decimals, grid counts
//! are integers, backlash is written in shortest form.

use std::fmt;

/// Stage axis as numbered by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAxis {
    /// X axis
    X,
    /// Y axis
    Y,
}

impl StageAxis {
    /// Axis number used in scan configuration
    pub fn code(&self) -> i64 {
        match self {
            Self::X => 1,
            Self::Y => 2,
        }
    }
}

/// Scan pattern selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPattern {
    /// Every fast-axis line swept in the same direction
    Raster,
    /// Alternate fast-axis direction each line
    Serpentine,
}

impl ScanPattern {
    /// Pattern code used in scan configuration
    pub fn code(&self) -> i64 {
        match self {
            Self::Raster => 0,
            Self::Serpentine => 1,
        }
    }
}

/// TTL output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlMode {
    /// Trigger output disabled
    Disabled,
    /// Trigger output pulses at each scan position
    ScanTrigger,
}

impl TtlMode {
    /// Mode code
    pub fn code(&self) -> i64 {
        match self {
            Self::Disabled => 0,
            Self::ScanTrigger => 2,
        }
    }
}

/// Backlash compensation distances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backlash {
    /// X distance
    pub x: f64,
    /// Y distance
    pub y: f64,
}

impl Default for Backlash {
    fn default() -> Self {
        Self { x: 0.05, y: 0.05 }
    }
}

/// Argument value with its wire formatting
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgValue {
    /// Integer, written as-is
    Int(i64),
    /// Float written with four decimals
    Fixed(f64),
    /// Float written in shortest round-trip form
    Plain(f64),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Fixed(v) => write!(f, "{:.4}", v),
            Self::Plain(v) => write!(f, "{}", v),
        }
    }
}

/// A single controller command
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    opcode: &'static str,
    args: Vec<(char, ArgValue)>,
}

impl Command {
    /// Command with no arguments
    pub fn new(opcode: &'static str) -> Self {
        Self {
            opcode,
            args: Vec::new(),
        }
    }

    /// Append a `KEY=VALUE` argument
    pub fn arg(mut self, key: char, value: ArgValue) -> Self {
        self.args.push((key, value));
        self
    }

    /// Opcode token
    pub fn opcode(&self) -> &str {
        self.opcode
    }

    /// Arguments in wire order
    pub fn args(&self) -> &[(char, ArgValue)] {
        &self.args
    }

    /// `TTL Y=<mode>`: configure the trigger output
    pub fn ttl(mode: TtlMode) -> Self {
        Self::new("TTL").arg('Y', ArgValue::Int(mode.code()))
    }

    /// `SN X=<fast> Y=<slow> F=<pattern>`: configure the scan axes
    pub fn scan_pattern(fast: StageAxis, slow: StageAxis, pattern: ScanPattern) -> Self {
        Self::new("SN")
            .arg('X', ArgValue::Int(fast.code()))
            .arg('Y', ArgValue::Int(slow.code()))
            .arg('F', ArgValue::Int(pattern.code()))
    }

    /// `RT Z=<seconds>`: dwell time at each scan position
    pub fn scan_time(exposure: f64) -> Self {
        Self::new("RT").arg('Z', ArgValue::Fixed(exposure))
    }

    /// `B X=<x> Y=<y>`: backlash compensation
    pub fn backlash(backlash: Backlash) -> Self {
        Self::new("B")
            .arg('X', ArgValue::Plain(backlash.x))
            .arg('Y', ArgValue::Plain(backlash.y))
    }

    /// `R X=<dx> Y=<dy>`: relative move
    pub fn relative_move(dx: f64, dy: f64) -> Self {
        Self::new("R")
            .arg('X', ArgValue::Fixed(dx))
            .arg('Y', ArgValue::Fixed(dy))
    }

    /// `Z`: zero the stage at the current position
    pub fn zero() -> Self {
        Self::new("Z")
    }

    /// `AR X=<nx> Y=<ny> Z=<rx> F=<ry>`: define the scan grid
    pub fn scan_range(nx: u32, ny: u32, rx: f64, ry: f64) -> Self {
        Self::new("AR")
            .arg('X', ArgValue::Int(i64::from(nx)))
            .arg('Y', ArgValue::Int(i64::from(ny)))
            .arg('Z', ArgValue::Fixed(rx))
            .arg('F', ArgValue::Fixed(ry))
    }

    /// `AH X=<x> Y=<y>`: move to the first grid point
    pub fn home_offset(x: f64, y: f64) -> Self {
        Self::new("AH")
            .arg('X', ArgValue::Fixed(x))
            .arg('Y', ArgValue::Fixed(y))
    }

    /// `AR`: start the scan
    pub fn start_scan() -> Self {
        Self::new("AR")
    }

    /// `/`: status query
    pub fn status() -> Self {
        Self::new(super::STATUS_QUERY)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for (key, value) in &self.args {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_precision() {
        assert_eq!(Command::scan_time(0.5).to_string(), "RT Z=0.5000");
        assert_eq!(Command::scan_time(12.345678).to_string(), "RT Z=12.3457");
        assert_eq!(
            Command::relative_move(1.0, -2.5).to_string(),
            "R X=1.0000 Y=-2.5000"
        );
    }

    #[test]
    fn test_integer_counts() {
        assert_eq!(
            Command::scan_range(3, 2, 0.1, 0.2).to_string(),
            "AR X=3 Y=2 Z=0.1000 F=0.2000"
        );
    }

    #[test]
    fn test_fixed_opcodes() {
        assert_eq!(Command::ttl(TtlMode::Disabled).to_string(), "TTL Y=0");
        assert_eq!(Command::ttl(TtlMode::ScanTrigger).to_string(), "TTL Y=2");
        assert_eq!(
            Command::scan_pattern(StageAxis::Y, StageAxis::X, ScanPattern::Raster).to_string(),
            "SN X=2 Y=1 F=0"
        );
        assert_eq!(Command::backlash(Backlash::default()).to_string(), "B X=0.05 Y=0.05");
        assert_eq!(Command::zero().to_string(), "Z");
        assert_eq!(Command::start_scan().to_string(), "AR");
        assert_eq!(Command::status().to_string(), "/");
    }

    #[test]
    fn test_home_offset_negative() {
        assert_eq!(
            Command::home_offset(-0.15000000000000002, -0.2).to_string(),
            "AH X=-0.1500 Y=-0.2000"
        );
    }

    #[test]
    fn test_opcode_and_args() {
        let cmd = Command::home_offset(1.0, 2.0);
        assert_eq!(cmd.opcode(), "AH");
        assert_eq!(cmd.args().len(), 2);
        assert_eq!(cmd.args()[0], ('X', ArgValue::Fixed(1.0)));
    }
}
