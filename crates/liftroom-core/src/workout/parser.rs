//! Plan import from plain text or spreadsheet exports.
//!
//! Two input shapes are recognized:
//!
//! ```text
//! # Push Day
//! Bench Press 3x8-12 @ 60kg [chest] rest 120 after_exercise
//! Dips 3 x AMRAP [triceps]
//! ```
//!
//! and delimited rows (comma, semicolon or tab) whose header names the
//! columns:
//!
//! ```text
//! Exercise,Sets,Reps,Weight,Muscle,Rest,Trigger
//! Squat,5,5,100,legs,180,after_set
//! ```

use regex::Regex;

use super::plan::{ExerciseTemplate, RestTrigger, WorkoutPlan};
use super::reps::RepsTarget;
use crate::error::ParseError;

const DEFAULT_PLAN_NAME: &str = "Imported plan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Exercise,
    Sets,
    Reps,
    Weight,
    Muscle,
    Rest,
    Trigger,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let h = header.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match h.as_str() {
            "exercise" | "name" | "movement" => Some(Column::Exercise),
            "sets" | "set count" => Some(Column::Sets),
            "reps" | "repetitions" | "target reps" => Some(Column::Reps),
            "weight" | "load" | "kg" | "lbs" | "target weight" => Some(Column::Weight),
            "muscle" | "muscle group" | "group" => Some(Column::Muscle),
            "rest" | "rest seconds" | "rest secs" => Some(Column::Rest),
            "trigger" | "rest trigger" => Some(Column::Trigger),
            _ => None,
        }
    }
}

pub struct PlanParser {
    line: Regex,
    weight: Regex,
    muscle: Regex,
    rest: Regex,
    trigger: Regex,
}

impl PlanParser {
    /// # Errors
    /// Fails only if one of the built-in patterns does not compile.
    pub fn new() -> Result<Self, ParseError> {
        let compile = |pattern: &str| Regex::new(pattern).map_err(|e| ParseError::Pattern(e.to_string()));
        Ok(Self {
            line: compile(
                r"(?i)^(?P<name>.+?)\s+(?P<sets>\d+)\s*[x×]\s*(?P<reps>\d+(?:\s*-\s*\d+)?|amrap|max)\b(?P<tail>.*)$",
            )?,
            weight: compile(r"(?i)@\s*(?P<w>\d+(?:\.\d+)?)\s*(?:kg|lbs?)?")?,
            muscle: compile(r"\[(?P<m>[^\]]+)\]")?,
            rest: compile(r"(?i)\brest\s+(?P<s>\d+)\s*s?\b")?,
            trigger: compile(r"(?i)\bafter[_\- ]?(?P<t>set|exercise)\b")?,
        })
    }

    /// Parse `input` into a plan. `name` overrides any title in the input.
    ///
    /// # Errors
    /// Returns the first line that could not be read, a missing required
    /// column, or [`ParseError::Empty`] when no exercise was found.
    pub fn parse(&self, input: &str, name: Option<&str>) -> Result<WorkoutPlan, ParseError> {
        let first = input
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#'));

        let (title, exercises) = match first.and_then(detect_delimiter) {
            Some(delimiter) => (None, self.parse_delimited(input, delimiter)?),
            None => self.parse_lines(input)?,
        };
        if exercises.is_empty() {
            return Err(ParseError::Empty);
        }

        let name = name
            .map(str::to_string)
            .or(title)
            .unwrap_or_else(|| DEFAULT_PLAN_NAME.to_string());
        Ok(WorkoutPlan::new(&name, exercises))
    }

    fn parse_lines(&self, input: &str) -> Result<(Option<String>, Vec<ExerciseTemplate>), ParseError> {
        let mut title = None;
        let mut exercises = Vec::new();

        for (idx, raw) in input.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(heading) = line.strip_prefix('#') {
                title.get_or_insert_with(|| heading.trim().to_string());
                continue;
            }
            if let Some(heading) = line.strip_suffix(':') {
                if exercises.is_empty() {
                    title.get_or_insert_with(|| heading.trim().to_string());
                }
                continue;
            }
            exercises.push(self.parse_line(line, idx + 1)?);
        }
        Ok((title, exercises))
    }

    fn parse_line(&self, line: &str, line_no: usize) -> Result<ExerciseTemplate, ParseError> {
        let caps = self.line.captures(line).ok_or_else(|| ParseError::Line {
            line: line_no,
            message: format!("expected '<exercise> <sets>x<reps>', got '{line}'"),
        })?;

        let name = caps["name"].trim().trim_end_matches([':', '-']).trim();
        let sets = parse_sets(&caps["sets"], line_no)?;
        let reps = RepsTarget::parse(&caps["reps"]).to_string();
        let mut exercise = ExerciseTemplate::new(name, sets, &reps);

        let tail = caps.name("tail").map(|m| m.as_str()).unwrap_or_default();
        if let Some(w) = self.weight.captures(tail) {
            exercise.target_weight = w["w"].parse::<f64>().ok();
        }
        if let Some(m) = self.muscle.captures(tail) {
            exercise.muscle_group = m["m"].trim().to_ascii_lowercase();
        }
        if let Some(r) = self.rest.captures(tail) {
            exercise.rest_seconds = Some(parse_rest(&r["s"], line_no)?);
        }
        if let Some(t) = self.trigger.captures(tail) {
            exercise.rest_trigger = t["t"].parse::<RestTrigger>().ok();
        }
        Ok(exercise)
    }

    fn parse_delimited(&self, input: &str, delimiter: char) -> Result<Vec<ExerciseTemplate>, ParseError> {
        let mut rows = input
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let Some((_, header)) = rows.next() else {
            return Err(ParseError::Empty);
        };
        let columns: Vec<Option<Column>> = header.split(delimiter).map(Column::from_header).collect();
        let position = |c: Column| columns.iter().position(|col| *col == Some(c));
        let exercise_col =
            position(Column::Exercise).ok_or_else(|| ParseError::MissingColumn("exercise".into()))?;
        let sets_col = position(Column::Sets).ok_or_else(|| ParseError::MissingColumn("sets".into()))?;

        let mut exercises = Vec::new();
        for (line_no, row) in rows {
            let cells: Vec<&str> = row.split(delimiter).map(str::trim).collect();
            let cell = |c: Option<usize>| c.and_then(|i| cells.get(i)).copied().filter(|s| !s.is_empty());

            let name = cell(Some(exercise_col)).ok_or_else(|| ParseError::Line {
                line: line_no,
                message: "missing exercise name".into(),
            })?;
            let sets = parse_sets(cell(Some(sets_col)).unwrap_or_default(), line_no)?;
            let reps = cell(position(Column::Reps))
                .map(|r| RepsTarget::parse(r).to_string())
                .unwrap_or_else(|| "10".to_string());

            let mut exercise = ExerciseTemplate::new(name, sets, &reps);
            if let Some(w) = cell(position(Column::Weight)) {
                exercise.target_weight = Some(parse_number(w, "weight", line_no)?);
            }
            if let Some(m) = cell(position(Column::Muscle)) {
                exercise.muscle_group = m.to_ascii_lowercase();
            }
            if let Some(r) = cell(position(Column::Rest)) {
                exercise.rest_seconds = Some(parse_rest(r, line_no)?);
            }
            if let Some(t) = cell(position(Column::Trigger)) {
                exercise.rest_trigger = Some(t.parse::<RestTrigger>().map_err(|e| ParseError::Line {
                    line: line_no,
                    message: e.to_string(),
                })?);
            }
            exercises.push(exercise);
        }
        Ok(exercises)
    }
}

/// Parse with a freshly built [`PlanParser`].
///
/// # Errors
/// See [`PlanParser::parse`].
pub fn parse_plan(input: &str, name: Option<&str>) -> Result<WorkoutPlan, ParseError> {
    PlanParser::new()?.parse(input, name)
}

fn detect_delimiter(header: &str) -> Option<char> {
    ['\t', ';', ','].into_iter().find(|d| {
        header
            .split(*d)
            .filter_map(Column::from_header)
            .any(|c| c == Column::Exercise)
    })
}

fn parse_sets(raw: &str, line: usize) -> Result<u32, ParseError> {
    match raw.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(ParseError::Line {
            line,
            message: format!("invalid set count '{raw}'"),
        }),
        Ok(n) => Ok(n),
    }
}

/// Whole seconds, with an optional trailing `s`.
fn parse_rest(raw: &str, line: usize) -> Result<u32, ParseError> {
    raw.trim()
        .trim_end_matches(['s', 'S'])
        .trim_end()
        .parse::<u32>()
        .map_err(|_| ParseError::Line {
            line,
            message: format!("invalid rest '{raw}', expected whole seconds"),
        })
}

fn parse_number(raw: &str, field: &str, line: usize) -> Result<f64, ParseError> {
    let cleaned = raw
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .trim()
        .replace(',', ".");
    cleaned.parse::<f64>().map_err(|_| ParseError::Line {
        line,
        message: format!("invalid {field} '{raw}'"),
    })
}
