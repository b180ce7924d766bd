//! Full reconciliation pass shared by the CLI and the daemon.
//!
//! ```text
//! list packages ─▶ group / resolve ─▶ scan wiki ─▶ per package (sorted):
//!     Latest_version, Latest_stable_version, Latest_unstable_version,
//!     every specific-version page on the wiki
//! ─▶ Version summary page
//! ```
//!
//! Listing packages or scanning the wiki aborts the pass. Everything after
//! that is per-page: failures are collected in the report and the pass moves
//! on.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use wikisync_core::registry::PackageSource;
use wikisync_core::title::{main_title, LatestKind, SUMMARY_PAGE};
use wikisync_core::types::{group_by_name, Package, VersionSet};
use wikisync_core::version::{parse_lenient, resolve_all, VersionTrio};
use wikisync_renderer::render_summary;
use wikisync_wiki::{WikiGateway, WriteResult};

use crate::engine::{GatedUpdater, PageChanges, PageFailure};
use crate::error::SyncError;
use crate::scan::{scan, WikiScan};

/// What a single pass did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    #[serde(serialize_with = "as_millis")]
    pub duration: Duration,
    pub packages: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub failures: Vec<PageFailure>,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl PassReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        PassReport {
            started_at,
            duration: Duration::ZERO,
            packages: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            deleted: 0,
            failures: Vec::new(),
        }
    }

    fn count(&mut self, write: &WriteResult) {
        match write {
            WriteResult::Created { .. } => self.created += 1,
            WriteResult::Updated { .. } => self.updated += 1,
            WriteResult::Unchanged { .. } => self.unchanged += 1,
            WriteResult::Deleted { .. } => self.deleted += 1,
            WriteResult::AlreadyAbsent { .. } => {}
        }
    }

    fn absorb(&mut self, changes: PageChanges) {
        for write in &changes.writes {
            self.count(write);
        }
        self.failures.extend(changes.failures);
    }

    fn fail(&mut self, title: impl Into<String>, err: impl ToString) {
        let failure = PageFailure::new(title, err);
        tracing::warn!(title = %failure.title, error = %failure.error, "full sync: page family failed");
        self.failures.push(failure);
    }

    /// Pages created, updated or deleted.
    pub fn changed(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run one complete pass of registry → wiki reconciliation.
pub fn run_full_sync(
    source: &dyn PackageSource,
    wiki: &dyn WikiGateway,
) -> Result<PassReport, SyncError> {
    let mut report = PassReport::new(Utc::now());
    let clock = Instant::now();
    tracing::info!("running wiki full sync");

    let sets = group_by_name(source.list_packages()?);
    let trios = resolve_all(&sets);
    let wiki_scan = scan(wiki)?;

    let names: BTreeSet<&String> = sets.keys().chain(wiki_scan.package_pages.keys()).collect();
    report.packages = names.len();

    let updater = GatedUpdater::new(wiki);
    let no_trio = VersionTrio::default();
    for name in names {
        let trio = trios.get(name).unwrap_or(&no_trio);
        reconcile_package(&updater, name, trio, &sets, &wiki_scan, &mut report);
    }

    match render_summary(&wiki_scan.known_tags, &sets) {
        Ok(table) => match wiki.edit_page(SUMMARY_PAGE, &table, true) {
            Ok(write) => report.count(&write),
            Err(err) => report.fail(SUMMARY_PAGE, err),
        },
        Err(err) => report.fail(SUMMARY_PAGE, err),
    }

    report.duration = clock.elapsed();
    tracing::info!(
        packages = report.packages,
        created = report.created,
        updated = report.updated,
        deleted = report.deleted,
        unchanged = report.unchanged,
        failures = report.failures.len(),
        elapsed_ms = report.duration.as_millis() as u64,
        "full sync finished"
    );
    Ok(report)
}

fn reconcile_package(
    updater: &GatedUpdater<'_>,
    name: &str,
    trio: &VersionTrio,
    sets: &VersionSet,
    wiki_scan: &WikiScan,
    report: &mut PassReport,
) {
    let slots = [
        (LatestKind::Latest, &trio.latest),
        (LatestKind::Stable, &trio.stable),
        (LatestKind::Unstable, &trio.unstable),
    ];
    for (kind, resolved) in slots {
        let Some(pkg) = resolved else { continue };
        match updater.update_latest(kind, pkg) {
            Ok(changes) => report.absorb(changes),
            Err(err) => report.fail(main_title(name, kind.segment()), err),
        }
    }

    let Some(tags) = wiki_scan.known_tags.get(name) else {
        return;
    };
    // Keyed by canonical version so `v1.0.0` in the registry matches a page
    // holding `1.0.0`.
    let known: HashMap<String, Package> = sets
        .get(name)
        .into_iter()
        .flatten()
        .map(|p| {
            let key = parse_lenient(&p.version)
                .map(|v| v.to_string())
                .unwrap_or_else(|| p.version.clone());
            (key, p.clone())
        })
        .collect();
    for tag in tags {
        match updater.process_specific_version_page(name, tag, &known) {
            Ok(changes) => report.absorb(changes),
            Err(err) => report.fail(main_title(name, tag), err),
        }
    }
}
