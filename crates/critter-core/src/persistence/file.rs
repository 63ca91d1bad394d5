use super::{EntityStore, MemoryStore, StoreResult, StoreSnapshot};
use crate::model::{Id, Schedule};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

pub fn save_snapshot_to_json<P: AsRef<Path>>(store: &MemoryStore, path: P) -> StoreResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &store.snapshot())?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> StoreResult<MemoryStore> {
    let file = File::open(path)?;
    let snapshot: StoreSnapshot = serde_json::from_reader(file)?;
    MemoryStore::from_snapshot(snapshot)
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ScheduleCsvRecord {
    id: Id,
    date: String,
    employee_ids: String,
    pet_ids: String,
    activities: String,
}

impl From<&Schedule> for ScheduleCsvRecord {
    fn from(schedule: &Schedule) -> Self {
        Self {
            id: schedule.id,
            date: schedule.date.format("%Y-%m-%d").to_string(),
            employee_ids: join_ids(&schedule.employee_ids),
            pet_ids: join_ids(&schedule.pet_ids),
            activities: schedule
                .activities
                .iter()
                .map(|skill| skill.as_str())
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

fn join_ids(ids: &[Id]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Writes every schedule, in creation order, as one CSV row. Returns the row count.
pub fn export_schedules_to_csv<P: AsRef<Path>>(
    store: &dyn EntityStore,
    path: P,
) -> StoreResult<usize> {
    let schedules = store.all_schedules()?;
    let mut writer = csv::Writer::from_path(path)?;
    for schedule in &schedules {
        writer.serialize(ScheduleCsvRecord::from(schedule))?;
    }
    writer.flush()?;
    Ok(schedules.len())
}
