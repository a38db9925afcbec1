//! Aggregates over teams and scores. Everything here is recomputed on read;
//! totals are never stored.

use std::cmp::Reverse;
use std::collections::HashMap;

use serde::Serialize;

use crate::error::Result;
use crate::store::Store;
use crate::types::{Score, Team};

#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    #[serde(flatten)]
    pub team: Team,
    pub total_score: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamStatistics {
    #[serde(flatten)]
    pub team: Team,
    pub total_score: i64,
    pub average_score: f64,
    /// Number of scores recorded for the team.
    pub activities_completed: usize,
    pub highest_score: i64,
}

/// One row of the public leaderboard feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub name: String,
    pub image_filename: Option<String>,
    pub total_score: i64,
    pub activities_completed: usize,
}

fn scores_by_team(scores: &[Score]) -> HashMap<i64, Vec<i64>> {
    let mut by_team: HashMap<i64, Vec<i64>> = HashMap::new();
    for score in scores {
        by_team.entry(score.team_id).or_default().push(score.score);
    }
    by_team
}

/// Total descending, then team id ascending.
fn rank<T>(rows: &mut [T], key: impl Fn(&T) -> (i64, i64)) {
    rows.sort_by_key(|row| {
        let (total, id) = key(row);
        (Reverse(total), id)
    });
}

/// Saturating sum. Rows written outside the validated path may hold any `i64`.
fn sum_scores(values: &[i64]) -> i64 {
    values.iter().fold(0i64, |acc, v| acc.saturating_add(*v))
}

/// Every team with its summed score, teams without scores at 0.
#[must_use]
pub fn compute_standings(teams: &[Team], scores: &[Score]) -> Vec<Standing> {
    let by_team = scores_by_team(scores);

    let mut standings: Vec<Standing> = teams
        .iter()
        .map(|team| Standing {
            total_score: by_team.get(&team.id).map_or(0, |values| sum_scores(values)),
            team: team.clone(),
        })
        .collect();

    rank(&mut standings, |s| (s.total_score, s.team.id));
    standings
}

#[must_use]
pub fn team_statistics(team: &Team, values: &[i64]) -> TeamStatistics {
    let total = sum_scores(values);
    let average = if values.is_empty() {
        0.0
    } else {
        total as f64 / values.len() as f64
    };

    TeamStatistics {
        team: team.clone(),
        total_score: total,
        average_score: average,
        activities_completed: values.len(),
        highest_score: values.iter().copied().max().unwrap_or(0),
    }
}

#[must_use]
pub fn all_team_statistics(teams: &[Team], scores: &[Score]) -> Vec<TeamStatistics> {
    let by_team = scores_by_team(scores);

    let mut stats: Vec<TeamStatistics> = teams
        .iter()
        .map(|team| {
            let values = by_team.get(&team.id).map_or(&[][..], Vec::as_slice);
            team_statistics(team, values)
        })
        .collect();

    rank(&mut stats, |s| (s.total_score, s.team.id));
    stats
}

#[must_use]
pub fn leaderboard_feed(teams: &[Team], scores: &[Score]) -> Vec<LeaderboardEntry> {
    all_team_statistics(teams, scores)
        .into_iter()
        .map(|s| LeaderboardEntry {
            id: s.team.id,
            name: s.team.name,
            image_filename: s.team.image_filename,
            total_score: s.total_score,
            activities_completed: s.activities_completed,
        })
        .collect()
}

pub fn load_standings(store: &dyn Store) -> Result<Vec<Standing>> {
    Ok(compute_standings(&store.list_teams()?, &store.list_scores()?))
}

pub fn load_team_statistics(store: &dyn Store) -> Result<Vec<TeamStatistics>> {
    Ok(all_team_statistics(&store.list_teams()?, &store.list_scores()?))
}

pub fn load_leaderboard(store: &dyn Store) -> Result<Vec<LeaderboardEntry>> {
    Ok(leaderboard_feed(&store.list_teams()?, &store.list_scores()?))
}
