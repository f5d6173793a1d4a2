use std::fs;
use stdmap::core::{InitialConditions, Span, StandardMap, WriteMode};
use stdmap::error::{Error, Result};
use stdmap::export::{write_runs, ExportOptions};
use tempfile::TempDir;

/// Re-exporting the same run never clobbers the earlier file.
#[test]
fn collisions_get_numbered_suffixes() -> Result<()> {
    let tmp = TempDir::new()?;
    let mut map = StandardMap::new(1.0, 10, Some(8))?;
    map.simulate(WriteMode::Append, InitialConditions::Random(1))?;
    let opts = ExportOptions::in_dir(tmp.path());

    let first = write_runs(map.history(), None, &opts)?;
    let second = write_runs(map.history(), None, &opts)?;
    let third = write_runs(map.history(), Some(Span::Single(1)), &opts)?;

    assert_eq!(first, vec![tmp.path().join("K-1.0-len-10.csv")]);
    assert_eq!(second, vec![tmp.path().join("K-1.0-len-10 (1).csv")]);
    assert_eq!(third, vec![tmp.path().join("K-1.0-len-10 (2).csv")]);
    assert_eq!(fs::read_to_string(&first[0])?, fs::read_to_string(&third[0])?);
    Ok(())
}

/// Batches are written with one (I, theta) column pair per trajectory.
#[test]
fn batch_columns_and_rows() -> Result<()> {
    let tmp = TempDir::new()?;
    let mut map = StandardMap::new(0.4, 6, None)?;
    map.simulate(
        WriteMode::Append,
        InitialConditions::from_pairs(&[[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]]),
    )?;
    let paths = write_runs(map.history(), None, &ExportOptions::in_dir(tmp.path()))?;
    let text = fs::read_to_string(&paths[0])?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "# K = 0.4");
    assert_eq!(lines[1], "I_1,theta_1,I_2,theta_2,I_3,theta_3");
    assert_eq!(lines[2], "0.1,0.2,0.3,0.4,0.5,0.6");
    assert_eq!(lines.len(), 2 + 6);
    Ok(())
}

/// Index range selection writes only the requested runs; invalid ranges write nothing.
#[test]
fn selection_is_validated_first() -> Result<()> {
    let tmp = TempDir::new()?;
    let mut map = StandardMap::new(1.0, 4, Some(1))?;
    for k in [0.5, 1.5, 2.5] {
        map.set_k(k)?;
        map.simulate(WriteMode::Append, InitialConditions::Random(1))?;
    }
    let opts = ExportOptions::in_dir(tmp.path());

    let err = write_runs(map.history(), Some(Span::Range(3, 2)), &opts).unwrap_err();
    assert!(matches!(err, Error::OutOfRange(_)));
    assert_eq!(fs::read_dir(tmp.path())?.count(), 0);

    let paths = write_runs(map.history(), Some(Span::Range(2, 3)), &opts)?;
    assert_eq!(
        paths,
        vec![
            tmp.path().join("K-1.5-len-4.csv"),
            tmp.path().join("K-2.5-len-4.csv"),
        ]
    );
    Ok(())
}
