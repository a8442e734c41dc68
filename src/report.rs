//! Per-run reduction accounting.
//!
//! A [`RunReport`] is threaded through the pipeline instead of ambient
//! global counters: each dedup pass records what it removed per subject,
//! and the final summary is emitted once at the end of the run.

/// The three classification passes, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Updated,
    CrossPosted,
    Duplicate,
}

impl Pass {
    /// Label used in log lines, matching the classification names.
    pub fn label(self) -> &'static str {
        match self {
            Pass::Updated => "UPDATED",
            Pass::CrossPosted => "CROSS POSTED",
            Pass::Duplicate => "DUPLICATE",
        }
    }
}

/// Reduction counts for one subject's feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectStats {
    pub subject: String,
    /// Articles pooled for this subject before any pass ran.
    pub pre: usize,
    pub updated: usize,
    pub cross_posted: usize,
    pub duplicate: usize,
    /// Cross-posted articles reassigned into this feed from another
    /// subject's fetch.
    pub incoming: usize,
}

impl SubjectStats {
    /// Articles ending up in this subject's output feed.
    pub fn post(&self) -> usize {
        self.pre - self.updated - self.cross_posted - self.duplicate + self.incoming
    }

    /// Absolute reduction. Negative when a feed gained more incoming
    /// cross-posts than it lost.
    pub fn reduction(&self) -> i64 {
        self.pre as i64 - self.post() as i64
    }

    /// Percentage reduction; 0.0 for an empty feed. Callers format with
    /// one decimal place.
    pub fn reduction_pct(&self) -> f64 {
        if self.pre == 0 {
            0.0
        } else {
            100.0 * self.reduction() as f64 / self.pre as f64
        }
    }

    fn removed_mut(&mut self, pass: Pass) -> &mut usize {
        match pass {
            Pass::Updated => &mut self.updated,
            Pass::CrossPosted => &mut self.cross_posted,
            Pass::Duplicate => &mut self.duplicate,
        }
    }
}

/// Structured per-subject counts for one run, in caller order.
#[derive(Debug, Default)]
pub struct RunReport {
    stats: Vec<SubjectStats>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subject with its pooled pre-count. Subjects are
    /// reported in registration order.
    pub fn add_subject(&mut self, subject: &str, pre: usize) {
        self.stats.push(SubjectStats {
            subject: subject.to_string(),
            pre,
            ..SubjectStats::default()
        });
    }

    /// Records articles removed from `subject` by `pass`. Unknown
    /// subjects are registered on the fly with a zero pre-count.
    pub fn add_removed(&mut self, subject: &str, pass: Pass, count: usize) {
        match self.stats.iter_mut().find(|s| s.subject == subject) {
            Some(stats) => *stats.removed_mut(pass) += count,
            None => {
                let mut stats = SubjectStats {
                    subject: subject.to_string(),
                    ..SubjectStats::default()
                };
                *stats.removed_mut(pass) += count;
                self.stats.push(stats);
            }
        }
    }

    /// Records articles reassigned into `subject` by cross-post
    /// resolution.
    pub fn add_incoming(&mut self, subject: &str, count: usize) {
        if let Some(stats) = self.stats.iter_mut().find(|s| s.subject == subject) {
            stats.incoming += count;
        }
    }

    pub fn subjects(&self) -> Vec<String> {
        self.stats.iter().map(|s| s.subject.clone()).collect()
    }

    pub fn stats(&self) -> &[SubjectStats] {
        &self.stats
    }

    pub fn subject_stats(&self, subject: &str) -> Option<&SubjectStats> {
        self.stats.iter().find(|s| s.subject == subject)
    }

    pub fn total_pre(&self) -> usize {
        self.stats.iter().map(|s| s.pre).sum()
    }

    pub fn total_post(&self) -> usize {
        self.stats.iter().map(|s| s.post()).sum()
    }

    /// Emits the final per-subject results plus a grand total.
    pub fn log_summary(&self) {
        for s in &self.stats {
            tracing::info!(
                subject = %s.subject,
                pre = s.pre,
                post = s.post(),
                reduction = s.reduction(),
                pct = %format!("{:.1}", s.reduction_pct()),
                "Final result"
            );
        }
        let pre = self.total_pre();
        let post = self.total_post();
        let reduction = pre as i64 - post as i64;
        let pct = if pre == 0 {
            0.0
        } else {
            100.0 * reduction as f64 / pre as f64
        };
        tracing::info!(
            subject = "TOTAL",
            pre = pre,
            post = post,
            reduction = reduction,
            pct = %format!("{pct:.1}"),
            "Final result"
        );
    }
}
