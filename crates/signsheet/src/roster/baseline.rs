//! The baseline driver roster shipped with signsheet.
//!
//! Roster text holds one driver per line as `Name StaffNumber`: the last
//! whitespace-separated token is the staff number and everything before it
//! is the name.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::Driver;
use crate::error::{Error, Result};

/// Drivers shipped with the application.
const SHIPPED_ROSTER: &str = "
Adam Scanlon 497584
Adrian Kerrigan 616303
Aidan Browne 845809
Aidan O'Brien 617301
Aidan Ridgeway 679471
Aisling O'Leary 847674
Alan O'Flynn 620807
Andrew Cosgrave 836974
Bart Nowaczek 738867
Bernard Considine 678864
Brendan O'Callaghan 358037
Brian Wakefield 672807
Bryan Jordan 794325
Chloe Reddan 845574
Christopher Harris 737143
Conor Flanagan 497568
Conor Murphy 678392
Damien Hegarty 618594
Damien O'Leary 617032
Damien O'Regan 446580
Denis McCarthy 676977
Denis O'Leary 354996
Dermot Coady 617849
Desmond O'Leary 508391
Edward Dean 843857
Erik O'Regan 619035
Fiona Walsh 843849
Gary Moore 845566
Gavin Brett 617326
Gavin Delaney 737968
Gerard Nawra 738875
Greg Ahern 738905
Humphrey Allen 737151
Ian Clarke 615099
Jack O'Riordan 847704
James Moore 618292
Jer Murphy 677248
Jim Leahy 676837
Joe Byrne 678902
Joe Stack 617660
John Buttimer 122238
John Duggan 622222
John Goggin 622486
Jonathan Boyd 619469
Jonathan Deasy 129720
Jonathan Dennehy 737951
Jonathan Hallihan 618969
Keith McNamara 622206
Ken Fox 677094
Kieran Brett 678872
Kieran Cotter 677434
Kieran Hegarty 128619
Konrad Michalski 846325
Kyle O'Donovan 845817
Liam Cotter 677124
Liam Martin 620831
Mark Dineen 453341
Martin Cotter 677167
Martin Dawe 621481
Matthew Ryan 453374
Michael Lane 447651
Niall McCarthy 618535
Noel Kelleher 621242
Pat Finnegan 619108
Paul Egan 618527
Robbie Walsh 845541
Roy Galvin 678732
Roy O'Sullivan 843830
Sean Cullinane 351725
Sean Kiely 846279
Shane Brohier 617741
Shane Kenny 496121
Stephen Healy 353108
Stephen Timoney 738883
Steve Fitzcarlos 847690
Terry White 619061
Thomas Gardiner 678074
Thomas Gordaneer 845949
Chris Gould 618306
Derek Fenlon 678791
Liam Mulcahy 620440
Tim O'Leary 618012
Tom Allen 619000
Tony Buckley 676918
Tom Loughnane 732737
Tom O'Mahony 618098
Tony Cummins 616958
William Hurley 678619
";

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<name>\S.*?)\s+(?P<staff>\S+)$").expect("Invalid roster line pattern")
    })
}

fn whitespace() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("Invalid whitespace pattern"))
}

/// Parse roster text into drivers, in file order.
///
/// Blank lines are skipped. Runs of whitespace inside a name collapse to a
/// single space.
///
/// # Errors
///
/// Returns [`Error::RosterLine`] for the first line that has no staff number.
pub fn parse_roster(raw: &str) -> Result<Vec<Driver>> {
    let mut drivers = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let caps = line_pattern()
            .captures(line)
            .ok_or_else(|| Error::RosterLine {
                line: index + 1,
                text: line.to_string(),
            })?;
        let name = whitespace().replace_all(&caps["name"], " ");
        drivers.push(Driver::new(name, &caps["staff"]));
    }
    Ok(drivers)
}

/// The fixed list of drivers eligible to sign records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    drivers: Vec<Driver>,
}

impl Baseline {
    /// The roster compiled into the binary.
    ///
    /// # Panics
    ///
    /// Panics if the embedded roster text is malformed.
    #[must_use]
    pub fn shipped() -> Self {
        Self::from_text(SHIPPED_ROSTER).expect("Invalid shipped roster")
    }

    /// Parse a baseline from roster text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RosterLine`] for the first malformed line.
    pub fn from_text(raw: &str) -> Result<Self> {
        parse_roster(raw).map(Self::from_drivers)
    }

    /// Load a baseline from a roster file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BaselineLoad`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_error = |message: String| Error::BaselineLoad {
            path: path.to_path_buf(),
            message,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        Self::from_text(&raw).map_err(|e| load_error(e.to_string()))
    }

    /// Build a baseline from drivers already in memory.
    #[must_use]
    pub fn from_drivers(drivers: Vec<Driver>) -> Self {
        Self { drivers }
    }

    /// Drivers in roster order.
    #[must_use]
    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    /// Number of baseline drivers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Whether the baseline has no drivers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}
