//! Bagpipe pitch scale and embellishment tables
//!
//! Every ornament resolves to a short run of scale pitches, which the
//! renderer emits as one grace-note group.

use crate::models::NoteToken;

use super::errors::RenderError;

/// The nine-note chanter scale, low to high
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pitch {
    LowG,
    LowA,
    B,
    C,
    D,
    E,
    F,
    HighG,
    HighA,
}

const SCALE: [Pitch; 9] = [
    Pitch::LowG,
    Pitch::LowA,
    Pitch::B,
    Pitch::C,
    Pitch::D,
    Pitch::E,
    Pitch::F,
    Pitch::HighG,
    Pitch::HighA,
];

impl Pitch {
    /// Parse a canonical pitch name. Bare `G` and `A` mean high G and low A.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "LG" => Some(Pitch::LowG),
            "LA" | "A" => Some(Pitch::LowA),
            "B" => Some(Pitch::B),
            "C" => Some(Pitch::C),
            "D" => Some(Pitch::D),
            "E" => Some(Pitch::E),
            "F" => Some(Pitch::F),
            "HG" | "G" => Some(Pitch::HighG),
            "HA" => Some(Pitch::HighA),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Pitch::LowG => "LG",
            Pitch::LowA => "LA",
            Pitch::B => "B",
            Pitch::C => "C",
            Pitch::D => "D",
            Pitch::E => "E",
            Pitch::F => "F",
            Pitch::HighG => "HG",
            Pitch::HighA => "HA",
        }
    }

    /// Absolute LilyPond pitch
    pub fn lilypond(self) -> &'static str {
        match self {
            Pitch::LowG => "g'",
            Pitch::LowA => "a'",
            Pitch::B => "b'",
            Pitch::C => "c''",
            Pitch::D => "d''",
            Pitch::E => "e''",
            Pitch::F => "f''",
            Pitch::HighG => "g''",
            Pitch::HighA => "a''",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Next pitch up, but never below `starting`; high A stays high A
    pub fn above(self, starting: Pitch) -> Pitch {
        if self == Pitch::HighA {
            return self;
        }
        if self >= starting {
            SCALE[self.index() + 1]
        } else {
            starting
        }
    }

    /// Next pitch down, but never above `starting`; low G stays low G
    pub fn below(self, starting: Pitch) -> Pitch {
        if self == Pitch::LowG {
            return self;
        }
        if self <= starting {
            SCALE[self.index() - 1]
        } else {
            starting
        }
    }

    /// Pitch struck down to from this one
    pub fn strike(self) -> Pitch {
        match self {
            Pitch::LowG | Pitch::LowA | Pitch::B | Pitch::C | Pitch::D => Pitch::LowG,
            Pitch::E => Pitch::LowA,
            Pitch::F => Pitch::E,
            Pitch::HighG => Pitch::F,
            Pitch::HighA => Pitch::HighG,
        }
    }
}

impl std::fmt::Display for Pitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ornament handler: token and previously rendered pitch -> grace pitches
pub type OrnamentFn = fn(&NoteToken, Option<Pitch>) -> Result<Vec<Pitch>, RenderError>;

/// Format a grace run; only the first note carries the duration
pub fn build_embellishment(pitches: &[Pitch], duration: u32) -> String {
    let notes = pitches
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if i == 0 {
                format!("{}{}", p.lilypond(), duration)
            } else {
                p.lilypond().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("\\grace {{ {} }}", notes)
}

fn pitch_at(token: &NoteToken, index: usize) -> Result<Pitch, RenderError> {
    let name = token
        .arg(index)
        .ok_or_else(|| RenderError::ornament(token, format!("missing pitch argument {}", index)))?;
    Pitch::parse(name).ok_or_else(|| RenderError::ornament(token, format!("unknown pitch {:?}", name)))
}

fn pitches(token: &NoteToken) -> Result<Vec<Pitch>, RenderError> {
    (0..token.ordered_arguments.len())
        .map(|i| pitch_at(token, i))
        .collect()
}

pub fn grace(token: &NoteToken, _prev: Option<Pitch>) -> Result<Vec<Pitch>, RenderError> {
    Ok(vec![pitch_at(token, 0)?])
}

pub fn strike(token: &NoteToken, _prev: Option<Pitch>) -> Result<Vec<Pitch>, RenderError> {
    Ok(vec![pitch_at(token, 0)?])
}

pub fn double(token: &NoteToken, _prev: Option<Pitch>) -> Result<Vec<Pitch>, RenderError> {
    use Pitch::*;

    let note = pitch_at(token, 0)?;
    let half = token.has_flag("half");
    let thumb = token.has_flag("thumb");
    if half && thumb {
        return Err(RenderError::ornament(token, "a doubling cannot be both half and thumb"));
    }

    let run = match note {
        HighA => vec![HighA, HighG],
        HighG if half => vec![HighG, F],
        HighG => vec![HighA, HighG, F],
        _ if half => vec![note, note.above(D)],
        _ if thumb => vec![HighA, note, note.above(D)],
        _ => vec![HighG, note, note.above(D)],
    };
    Ok(run)
}

pub fn gracestrike(token: &NoteToken, _prev: Option<Pitch>) -> Result<Vec<Pitch>, RenderError> {
    let all = pitches(token)?;
    let Some(&note) = all.last() else {
        return Err(RenderError::ornament(token, "missing struck pitch"));
    };
    let struck = note.strike();
    if struck == note {
        return Err(RenderError::ornament(token, format!("no pitch below {} to strike", note)));
    }
    if token.has_flag("half") {
        return Ok(vec![note, struck]);
    }

    let grace = if all.len() > 1 { all[0] } else { Pitch::HighG };
    if grace <= note {
        return Err(RenderError::ornament(
            token,
            format!("grace {} is not above {}", grace, note),
        ));
    }
    Ok(vec![grace, note, struck])
}

fn grip_run(prev: Option<Pitch>) -> Vec<Pitch> {
    let middle = if prev == Some(Pitch::D) { Pitch::B } else { Pitch::D };
    vec![Pitch::LowG, middle, Pitch::LowG]
}

pub fn grip(token: &NoteToken, prev: Option<Pitch>) -> Result<Vec<Pitch>, RenderError> {
    let mut run = grip_run(prev);
    if token.has_flag("light") {
        run.remove(0);
    }
    Ok(run)
}

pub fn taorluath(_token: &NoteToken, prev: Option<Pitch>) -> Result<Vec<Pitch>, RenderError> {
    let mut run = grip_run(prev);
    run.push(Pitch::E);
    Ok(run)
}

pub fn birl(token: &NoteToken, _prev: Option<Pitch>) -> Result<Vec<Pitch>, RenderError> {
    use Pitch::*;

    let leading = [("thumb", HighA), ("heavy", HighG)]
        .iter()
        .filter(|(flag, _)| token.has_flag(flag))
        .map(|&(_, p)| p)
        .collect::<Vec<_>>();

    match (leading.as_slice(), token.has_flag("long")) {
        ([], false) => Ok(vec![LowG, LowA, LowG]),
        ([], true) => Ok(vec![LowA, LowG, LowA, LowG]),
        ([lead], false) => Ok(vec![*lead, LowA, LowG, LowA, LowG]),
        _ => Err(RenderError::ornament(token, "conflicting birl modifiers")),
    }
}

pub fn throw(token: &NoteToken, _prev: Option<Pitch>) -> Result<Vec<Pitch>, RenderError> {
    use Pitch::*;

    if token.has_flag("heavy") {
        Ok(vec![LowG, D, LowG, C])
    } else {
        Ok(vec![LowG, D, C])
    }
}

pub fn cadence(token: &NoteToken, _prev: Option<Pitch>) -> Result<Vec<Pitch>, RenderError> {
    let run = pitches(token)?;
    if run.is_empty() {
        return Err(RenderError::ornament(token, "cadence without pitches"));
    }
    Ok(run)
}

pub fn crunluath(token: &NoteToken, prev: Option<Pitch>) -> Result<Vec<Pitch>, RenderError> {
    use Pitch::*;

    let from = match token.arg(0) {
        Some(_) => Some(pitch_at(token, 0)?),
        None => prev,
    };
    let middle = if from == Some(D) { B } else { D };

    let mut run = vec![LowG, middle, LowG, E, LowA, F, LowA];
    if token.has_flag("heavy") {
        run.insert(0, HighG);
    }
    Ok(run)
}

pub fn rodin(_token: &NoteToken, _prev: Option<Pitch>) -> Result<Vec<Pitch>, RenderError> {
    Ok(vec![Pitch::LowG, Pitch::B, Pitch::LowG])
}
