//! Code for reading plant records from a CSV file.
use super::*;
use crate::plant::PlantRecord;
use std::path::Path;

const PLANTS_FILE_NAME: &str = "plants.csv";

/// Read plant records from the model directory.
///
/// Records are not validated here: data-quality problems are handled when the plant registry is
/// built, so that a bad record excludes one plant rather than aborting the run.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The plant records, in file order, or an error if the file is malformed.
pub fn read_plants(model_dir: &Path) -> Result<Vec<PlantRecord>> {
    let file_path = model_dir.join(PLANTS_FILE_NAME);
    Ok(read_csv(&file_path)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::{DataQualityReason, PlantRegistry};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_read_plants() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(PLANTS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "id,company,country,technology,capacity,start_year,end_year
P1,Baowu,China,BF; BOF,10.5,,
P2,,China,EAF,,2021,2025
P3,Ansteel,China,,-1,2010,"
            )
            .unwrap();
        }

        let plants = read_plants(dir.path()).unwrap();
        assert_eq!(plants.len(), 3);
        assert_eq!(
            plants[0],
            PlantRecord {
                id: "P1".into(),
                company: "Baowu".into(),
                country: "China".into(),
                technology: "BF; BOF".into(),
                capacity: Some(10.5),
                start_year: None,
                end_year: None,
                retired_year: None,
                idled_year: None,
            }
        );
        assert_eq!(plants[1].company, "");
        assert_eq!(plants[1].capacity, None);
        assert_eq!(plants[1].start_year, Some(2021));
        assert_eq!(plants[2].capacity, Some(-1.0));
    }

    #[test]
    fn test_read_plants_retired_and_idled() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(PLANTS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "id,company,country,technology,capacity,start_year,end_year,retired_year,idled_year
P1,Baowu,China,EAF,1.0,2000,2030,2025,"
            )
            .unwrap();
        }

        let plants = read_plants(dir.path()).unwrap();
        assert_eq!(plants[0].retired_year, Some(2025));
        assert_eq!(plants[0].idled_year, None);
        assert_eq!(plants[0].effective_end_year(), Some(2025));
    }

    #[test]
    fn test_read_plants_invalid_capacity() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(PLANTS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "id,company,country,technology,capacity,start_year,end_year
BADCAP,X,China,EAF,n/a,,
P2,Y,China,EAF,2.0,,"
            )
            .unwrap();
        }

        let plants = read_plants(dir.path()).unwrap();
        assert_eq!(plants.len(), 2);
        assert_eq!(plants[0].capacity, None);
        assert_eq!(plants[1].capacity, Some(2.0));

        let (registry, issues) = PlantRegistry::from_records(plants);
        assert_eq!(registry.len(), 1);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].plant_id.as_str(), "BADCAP");
        assert_eq!(issues[0].reason, DataQualityReason::MissingCapacity);
    }

    #[test]
    fn test_read_plants_bad_year() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(PLANTS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "id,company,country,technology,capacity,start_year,end_year
P1,Baowu,China,EAF,1.0,soon,"
            )
            .unwrap();
        }

        assert!(read_plants(dir.path()).is_err());
    }
}
