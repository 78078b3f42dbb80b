//! Region distribution
//!
//! Regions come from configuration. Each region lists its countries in
//! `<list_dir>/<region>-country_list`; each country lists its BE numbers in
//! `<benum_dir>/<country>_benums`. Problems with any of these files are
//! logged and that region or country is skipped.
//!
//! Distribution walks regions in configuration order and countries in file
//! order. The first country holding a record's identifier claims it.

use crate::error_log::ErrorLog;
use crate::intake::{ensure_dir, move_file};
use crate::state::RunState;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const COUNTRY_LIST_SUFFIX: &str = "-country_list";
const BENUM_SUFFIX: &str = "_benums";

#[derive(Debug, Clone)]
pub struct Country {
    pub name: String,
    pub identifiers: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    pub countries: Vec<Country>,
}

#[derive(Debug, Clone, Default)]
pub struct CountryIndex {
    pub regions: Vec<Region>,
}

/// Non-empty, trimmed lines of a reference file.
fn read_entries(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let entries: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if entries.is_empty() {
        return Err(format!("{}: file is empty", path.display()));
    }
    Ok(entries)
}

impl CountryIndex {
    pub fn country_list_path(list_dir: &Path, region: &str) -> PathBuf {
        list_dir.join(format!("{}{}", region, COUNTRY_LIST_SUFFIX))
    }

    pub fn benum_path(benum_dir: &Path, country: &str) -> PathBuf {
        benum_dir.join(format!("{}{}", country, BENUM_SUFFIX))
    }

    /// Load every region. Never fails; problems land in `log`.
    pub fn load(list_dir: &Path, benum_dir: &Path, regions: &[String], log: &mut ErrorLog) -> Self {
        let mut index = CountryIndex::default();
        for region in regions {
            let list_path = Self::country_list_path(list_dir, region);
            let country_names = match read_entries(&list_path) {
                Ok(names) => names,
                Err(e) => {
                    log.write(format!("Region {} skipped, country list unusable: {}", region, e));
                    continue;
                }
            };

            let mut countries = Vec::with_capacity(country_names.len());
            for name in country_names {
                match read_entries(&Self::benum_path(benum_dir, &name)) {
                    Ok(ids) => countries.push(Country {
                        name,
                        identifiers: ids.into_iter().collect(),
                    }),
                    Err(e) => log.write(format!(
                        "Country {} in region {} skipped, BE list unusable: {}",
                        name, region, e
                    )),
                }
            }
            debug!(region = %region, countries = countries.len(), "Loaded region");
            index.regions.push(Region {
                name: region.clone(),
                countries,
            });
        }
        index
    }

    /// First `(region, country)` in declared order holding `identifier`.
    pub fn locate(&self, identifier: &str) -> Option<(&str, &str)> {
        self.regions.iter().find_map(|region| {
            region
                .countries
                .iter()
                .find(|c| c.identifiers.contains(identifier))
                .map(|c| (region.name.as_str(), c.name.as_str()))
        })
    }
}

/// Move every unprocessed record whose identifier a country claims into
/// `<graphbase>/<region>/<country>/<YYYY>/<MM>/` under its renamed name.
///
/// Returns the number of records placed. A failed move leaves the record
/// unprocessed; it is picked up by the quarantine sweep.
pub fn distribute(index: &CountryIndex, state: &mut RunState, graphbase: &Path, log: &mut ErrorLog) -> usize {
    let mut placed = 0;
    for record in state.records_mut() {
        if record.is_processed() {
            continue;
        }
        let Some((region, country)) = index.locate(&record.identifier) else {
            debug!(file = %record.fname, identifier = %record.identifier, "No country claims");
            continue;
        };
        let dest_dir = graphbase
            .join(region)
            .join(country)
            .join(record.year_month_dir());
        let moved = ensure_dir(&dest_dir)
            .and_then(|_| move_file(record.location(), &dest_dir, &record.renamed_name));
        match moved {
            Ok(path) => {
                info!(file = %record.renamed_name, region, country, "Placed");
                record.mark_processed(path);
                placed += 1;
            }
            Err(e) => {
                let msg = format!("{}: placement failed: {}", record.command_path(), e);
                record.errors.push(msg.clone());
                log.write(msg);
            }
        }
    }
    placed
}
