//! Simulation report generation.

use crate::character::Rank;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of one simulated session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub final_level: u32,
    pub final_rank: Rank,
    pub kills: u64,
    pub extraction_attempts: u32,
    pub extractions: u32,
    pub soldiers: usize,
    pub army_power: f64,
    pub missions_sent: u32,
    pub missions_completed: u32,
    pub rebels: u32,
    pub dungeons_cleared: u32,
    pub quests_completed: u32,
    pub achievements: u32,
    pub gold: u64,
    pub item_stacks: usize,
    /// Minute each rank was first reached, `Rank::ALL` order.
    pub rank_minutes: [Option<u64>; 8],
}

/// Aggregated results from multiple simulation runs.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub num_runs: u32,
    pub hours: u32,

    pub avg_final_level: f64,
    pub avg_soldiers: f64,
    pub avg_army_power: f64,
    pub extraction_rate: f64,
    pub avg_missions_completed: f64,
    pub avg_rebels: f64,
    pub avg_quests_completed: f64,
    pub avg_achievements: f64,
    pub avg_gold: f64,

    /// Final rank name -> number of runs.
    pub rank_distribution: BTreeMap<String, u32>,
    /// Average minute each rank was reached, over the runs that reached it.
    pub avg_minutes_to_rank: Vec<(Rank, Option<f64>)>,

    #[serde(skip)]
    pub run_stats: Vec<RunStats>,
}

fn average<F: Fn(&RunStats) -> f64>(runs: &[RunStats], f: F) -> f64 {
    if runs.is_empty() {
        return 0.0;
    }
    runs.iter().map(f).sum::<f64>() / runs.len() as f64
}

impl SimReport {
    pub fn from_runs(runs: Vec<RunStats>, hours: u32) -> Self {
        let attempts: u64 = runs.iter().map(|r| r.extraction_attempts as u64).sum();
        let successes: u64 = runs.iter().map(|r| r.extractions as u64).sum();
        let extraction_rate = if attempts == 0 {
            0.0
        } else {
            successes as f64 / attempts as f64
        };

        let mut rank_distribution = BTreeMap::new();
        for run in &runs {
            *rank_distribution
                .entry(run.final_rank.name().to_string())
                .or_insert(0) += 1;
        }

        let avg_minutes_to_rank = Rank::ALL
            .into_iter()
            .map(|rank| {
                let reached: Vec<u64> = runs
                    .iter()
                    .filter_map(|r| r.rank_minutes[rank.index()])
                    .collect();
                let avg = if reached.is_empty() {
                    None
                } else {
                    Some(reached.iter().sum::<u64>() as f64 / reached.len() as f64)
                };
                (rank, avg)
            })
            .collect();

        Self {
            num_runs: runs.len() as u32,
            hours,
            avg_final_level: average(&runs, |r| r.final_level as f64),
            avg_soldiers: average(&runs, |r| r.soldiers as f64),
            avg_army_power: average(&runs, |r| r.army_power),
            extraction_rate,
            avg_missions_completed: average(&runs, |r| r.missions_completed as f64),
            avg_rebels: average(&runs, |r| r.rebels as f64),
            avg_quests_completed: average(&runs, |r| r.quests_completed as f64),
            avg_achievements: average(&runs, |r| r.achievements as f64),
            avg_gold: average(&runs, |r| r.gold as f64),
            rank_distribution,
            avg_minutes_to_rank,
            run_stats: runs,
        }
    }

    /// Generate a text report.
    pub fn to_text(&self) -> String {
        let mut report = String::new();

        report.push_str("═══════════════════════════════════════════════════════════════\n");
        report.push_str("                    SIMULATION REPORT\n");
        report.push_str("═══════════════════════════════════════════════════════════════\n\n");

        report.push_str(&format!(
            "Runs: {} sessions of {} h\n\n",
            self.num_runs, self.hours
        ));

        report.push_str("── PROGRESSION ──────────────────────────────────────────────────\n");
        report.push_str(&format!("  Avg Final Level:     {:.1}\n", self.avg_final_level));
        report.push_str(&format!("  Avg Quests Done:     {:.1}\n", self.avg_quests_completed));
        report.push_str(&format!("  Avg Achievements:    {:.1}\n", self.avg_achievements));
        report.push_str(&format!("  Avg Gold:            {:.0}\n\n", self.avg_gold));

        report.push_str("── SHADOW ARMY ──────────────────────────────────────────────────\n");
        report.push_str(&format!(
            "  Extraction Rate:     {:.1}%\n",
            self.extraction_rate * 100.0
        ));
        report.push_str(&format!("  Avg Soldiers:        {:.1}\n", self.avg_soldiers));
        report.push_str(&format!("  Avg Army Power:      {:.0}\n", self.avg_army_power));
        report.push_str(&format!(
            "  Avg Missions Done:   {:.1}\n",
            self.avg_missions_completed
        ));
        report.push_str(&format!("  Avg Rebels:          {:.2}\n\n", self.avg_rebels));

        report.push_str("── RANK PACING ──────────────────────────────────────────────────\n");
        for (rank, minutes) in &self.avg_minutes_to_rank {
            let finished = self
                .rank_distribution
                .get(rank.name())
                .copied()
                .unwrap_or(0);
            let pct = if self.num_runs == 0 {
                0.0
            } else {
                finished as f64 / self.num_runs as f64 * 100.0
            };
            let bar: String = "█".repeat((pct / 5.0) as usize);
            match minutes {
                Some(m) => report.push_str(&format!(
                    "  {:>3}: reached at {:>7.1} min, ended here {:>5.1}% {}\n",
                    rank.name(),
                    m,
                    pct,
                    bar
                )),
                None => report.push_str(&format!("  {:>3}: not reached\n", rank.name())),
            }
        }

        report.push_str("\n═══════════════════════════════════════════════════════════════\n");
        report
    }

    /// Generate a JSON report for further analysis.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_generation() {
        let mut fast = RunStats {
            final_level: 12,
            final_rank: Rank::D,
            extraction_attempts: 10,
            extractions: 4,
            soldiers: 4,
            ..Default::default()
        };
        fast.rank_minutes[0] = Some(0);
        fast.rank_minutes[1] = Some(40);
        let mut slow = RunStats {
            final_level: 8,
            final_rank: Rank::E,
            ..Default::default()
        };
        slow.rank_minutes[0] = Some(0);

        let report = SimReport::from_runs(vec![fast, slow], 2);
        assert_eq!(report.num_runs, 2);
        assert!((report.avg_final_level - 10.0).abs() < 1e-9);
        assert!((report.extraction_rate - 0.4).abs() < 1e-9);
        assert_eq!(report.rank_distribution.get("D"), Some(&1));
        assert_eq!(report.avg_minutes_to_rank[1], (Rank::D, Some(40.0)));
        assert_eq!(report.avg_minutes_to_rank[2], (Rank::C, None));

        let text = report.to_text();
        assert!(text.contains("Extraction Rate:     40.0%"));
        assert!(report.to_json().contains("\"avg_final_level\""));
    }

    #[test]
    fn test_empty_report() {
        let report = SimReport::from_runs(Vec::new(), 1);
        assert_eq!(report.avg_final_level, 0.0);
        assert_eq!(report.extraction_rate, 0.0);
    }
}
