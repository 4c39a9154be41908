use serde_json::Value;

use crate::error::{FetchError, FetchResult};

/// One division's scores in the order the server listed them.
#[derive(Debug, Clone, PartialEq)]
pub struct DivisionScores {
    pub division: String,
    pub teams: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreSnapshot {
    pub divisions: Vec<DivisionScores>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub rank: usize,
    pub team: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DivisionBoard {
    pub name: String,
    pub entries: Vec<RankedEntry>,
}

impl DivisionBoard {
    /// Two display columns; the first one gets the extra row when the count is odd.
    pub fn columns(&self) -> (&[RankedEntry], &[RankedEntry]) {
        let half = self.entries.len().div_ceil(2);
        self.entries.split_at(half)
    }
}

pub fn parse_scores_json(raw: &str) -> FetchResult<ScoreSnapshot> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(ScoreSnapshot::default());
    }

    let root: Value = serde_json::from_str(trimmed)?;
    let Some(root) = root.as_object() else {
        return Err(FetchError::Parse("scores root is not an object".to_string()));
    };

    let mut divisions = Vec::with_capacity(root.len());
    for (division, teams) in root {
        let Some(teams) = teams.as_object() else {
            return Err(FetchError::Parse(format!(
                "division {division} is not an object"
            )));
        };
        let mut parsed = Vec::with_capacity(teams.len());
        for (team, score) in teams {
            let Some(score) = score.as_f64() else {
                return Err(FetchError::Parse(format!(
                    "score for {team} in {division} is not a number"
                )));
            };
            parsed.push((team.clone(), score));
        }
        divisions.push(DivisionScores {
            division: division.clone(),
            teams: parsed,
        });
    }

    Ok(ScoreSnapshot { divisions })
}

/// Ranks one division by descending score. Equal scores keep their listed order.
pub fn rank_division(scores: &DivisionScores) -> DivisionBoard {
    let mut teams: Vec<&(String, f64)> = scores.teams.iter().collect();
    // `sort_by` is stable.
    teams.sort_by(|a, b| b.1.total_cmp(&a.1));

    let entries = teams
        .into_iter()
        .enumerate()
        .map(|(idx, (team, score))| RankedEntry {
            rank: idx + 1,
            team: team.clone(),
            score: *score,
        })
        .collect();

    DivisionBoard {
        name: scores.division.clone(),
        entries,
    }
}

/// Builds every division board. Divisions listed in `preferred` come first
/// (matched case-insensitively), the rest keep document order.
pub fn rank_snapshot(snapshot: &ScoreSnapshot, preferred: &[String]) -> Vec<DivisionBoard> {
    let mut ordered: Vec<&DivisionScores> = Vec::with_capacity(snapshot.divisions.len());
    for name in preferred {
        let name = name.to_lowercase();
        if let Some(div) = snapshot
            .divisions
            .iter()
            .find(|d| d.division.to_lowercase() == name)
            && !ordered.iter().any(|seen| std::ptr::eq(*seen, div))
        {
            ordered.push(div);
        }
    }
    for div in &snapshot.divisions {
        if !ordered.iter().any(|seen| std::ptr::eq(*seen, div)) {
            ordered.push(div);
        }
    }

    ordered.into_iter().map(rank_division).collect()
}

/// Rounds to three decimals and drops trailing zeros, e.g. `12.5`, `7`, `3.142`.
pub fn format_score(score: f64) -> String {
    let rounded = (score * 1000.0).round() / 1000.0;
    let text = format!("{rounded:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
