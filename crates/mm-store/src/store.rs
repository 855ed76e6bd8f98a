use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use mm_core::{CorrelateConfig, CorrelationReport, Decay, Moment, SOURCE_COUNT, Source};

use crate::error::{Result, StoreError};
use crate::schema;

/// One row of the `runs` table, without its moments.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub id: Uuid,
    pub video_id: String,
    pub created_at: String,
    pub window_secs: f64,
    pub slide_secs: f64,
    pub decay: Decay,
    pub moment_count: usize,
    pub skipped_total: usize,
    pub windows_scanned: usize,
    pub events_indexed: usize,
}

/// A persisted run with its ranked moments, in stored rank order.
#[derive(Clone, Debug)]
pub struct StoredRun {
    pub summary: RunSummary,
    pub moments: Vec<Moment>,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Save ---

    /// Persist a finished run and its moments in one transaction.
    /// Returns the new run id.
    pub fn save_run(
        &self,
        video_id: &str,
        config: &CorrelateConfig,
        report: &CorrelationReport,
    ) -> Result<Uuid> {
        let run_id = Uuid::new_v4();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO runs (id, video_id, window_secs, slide_secs, decay, max_moments,
                               min_score, skipped_visual, skipped_speech, skipped_comment,
                               skipped_engagement, windows_scanned, events_indexed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                run_id.to_string(),
                video_id,
                config.window_secs,
                config.slide_secs,
                config.decay.as_str(),
                config.max_moments as i64,
                config.min_score,
                report.skipped.visual as i64,
                report.skipped.speech as i64,
                report.skipped.comment as i64,
                report.skipped.engagement as i64,
                report.windows_scanned as i64,
                report.events_indexed as i64,
            ],
        )?;

        for (rank, moment) in report.moments.iter().enumerate() {
            let sources: Vec<&str> = moment.contributing.iter().map(|s| s.as_str()).collect();
            tx.execute(
                "INSERT INTO moments (id, run_id, rank, start_secs, end_secs, score, sources,
                                      mag_visual, mag_speech, mag_comment, mag_engagement)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    Uuid::new_v4().to_string(),
                    run_id.to_string(),
                    rank as i64,
                    moment.start,
                    moment.end,
                    moment.score,
                    sources.join(","),
                    moment.magnitudes[Source::Visual.index()],
                    moment.magnitudes[Source::Speech.index()],
                    moment.magnitudes[Source::Comment.index()],
                    moment.magnitudes[Source::Engagement.index()],
                ],
            )?;
        }

        tx.commit()?;
        tracing::info!(
            "saved run {run_id} for video '{video_id}' ({} moments)",
            report.moments.len()
        );
        Ok(run_id)
    }

    // --- Load ---

    pub fn load_run(&self, run_id: Uuid) -> Result<StoredRun> {
        let summary = self
            .run_summary(run_id)?
            .ok_or_else(|| StoreError::NotFound(format!("run {run_id}")))?;
        let moments = self.load_moments(run_id)?;
        Ok(StoredRun { summary, moments })
    }

    /// Most recent run, optionally filtered to one video.
    pub fn latest_run(&self, video_id: Option<&str>) -> Result<Option<StoredRun>> {
        let id: Option<String> = match video_id {
            Some(vid) => self
                .conn
                .query_row(
                    "SELECT id FROM runs WHERE video_id = ?1
                     ORDER BY created_at DESC, rowid DESC LIMIT 1",
                    [vid],
                    |row| row.get(0),
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    "SELECT id FROM runs ORDER BY created_at DESC, rowid DESC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?,
        };

        match id {
            Some(id) => {
                let run_id = parse_uuid(&id)?;
                Ok(Some(self.load_run(run_id)?))
            }
            None => Ok(None),
        }
    }

    /// All runs, newest first.
    pub fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.video_id, r.created_at, r.window_secs, r.slide_secs, r.decay,
                    r.skipped_visual + r.skipped_speech + r.skipped_comment + r.skipped_engagement,
                    r.windows_scanned, r.events_indexed,
                    (SELECT count(*) FROM moments m WHERE m.run_id = r.id)
             FROM runs r
             ORDER BY r.created_at DESC, r.rowid DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, i64>(8)?,
                row.get::<_, i64>(9)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, video_id, created_at, window, slide, decay, skipped, scanned, indexed, count) =
                row?;
            summaries.push(RunSummary {
                id: parse_uuid(&id)?,
                video_id,
                created_at,
                window_secs: window,
                slide_secs: slide,
                decay: parse_decay(&decay)?,
                moment_count: count as usize,
                skipped_total: skipped as usize,
                windows_scanned: scanned as usize,
                events_indexed: indexed as usize,
            });
        }
        Ok(summaries)
    }

    pub fn delete_run(&self, run_id: Uuid) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM runs WHERE id = ?1", [run_id.to_string()])?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("run {run_id}")));
        }
        Ok(())
    }

    // --- Internals ---

    fn run_summary(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let row = self
            .conn
            .query_row(
                "SELECT video_id, created_at, window_secs, slide_secs, decay,
                        skipped_visual + skipped_speech + skipped_comment + skipped_engagement,
                        windows_scanned, events_indexed,
                        (SELECT count(*) FROM moments m WHERE m.run_id = runs.id)
                 FROM runs WHERE id = ?1",
                [run_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                        row.get::<_, i64>(8)?,
                    ))
                },
            )
            .optional()?;

        let Some((video_id, created_at, window, slide, decay, skipped, scanned, indexed, count)) =
            row
        else {
            return Ok(None);
        };

        Ok(Some(RunSummary {
            id: run_id,
            video_id,
            created_at,
            window_secs: window,
            slide_secs: slide,
            decay: parse_decay(&decay)?,
            moment_count: count as usize,
            skipped_total: skipped as usize,
            windows_scanned: scanned as usize,
            events_indexed: indexed as usize,
        }))
    }

    fn load_moments(&self, run_id: Uuid) -> Result<Vec<Moment>> {
        let mut stmt = self.conn.prepare(
            "SELECT start_secs, end_secs, score, sources,
                    mag_visual, mag_speech, mag_comment, mag_engagement
             FROM moments WHERE run_id = ?1 ORDER BY rank ASC",
        )?;

        let rows = stmt.query_map([run_id.to_string()], |row| {
            Ok((
                row.get::<_, f64>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, f64>(7)?,
            ))
        })?;

        let mut moments = Vec::new();
        for row in rows {
            let (start, end, score, sources, visual, speech, comment, engagement) = row?;
            let mut magnitudes = [0.0; SOURCE_COUNT];
            magnitudes[Source::Visual.index()] = visual;
            magnitudes[Source::Speech.index()] = speech;
            magnitudes[Source::Comment.index()] = comment;
            magnitudes[Source::Engagement.index()] = engagement;

            moments.push(Moment {
                start,
                end,
                score,
                contributing: parse_sources(&sources)?,
                magnitudes,
            });
        }
        Ok(moments)
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::InvalidData(format!("bad uuid '{s}': {e}")))
}

fn parse_decay(s: &str) -> Result<Decay> {
    Decay::parse(s).ok_or_else(|| StoreError::InvalidData(format!("unknown decay '{s}'")))
}

fn parse_sources(csv: &str) -> Result<Vec<Source>> {
    if csv.is_empty() {
        return Ok(Vec::new());
    }
    csv.split(',')
        .map(|s| {
            Source::parse(s).ok_or_else(|| StoreError::InvalidData(format!("unknown source '{s}'")))
        })
        .collect()
}
