//! Tab-separated label tables.
//!
//! Input tables map an atlas's own labels to region names. Two layouts are
//! accepted: a header row naming an `index` column and a name column
//! (`name`, `regions`, `region` or `label`, in any order), or bare
//! `index<TAB>name` rows. Lines starting with `#` are comments.
//!
//! The merged table is written with an `index\tname` header, one row per
//! merged label in ascending order.

use anyhow::{bail, Context, Result};
use atlasmerge_core::merge::LabelTable;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

const INDEX_COLUMN: &str = "index";
const NAME_COLUMNS: [&str; 4] = ["name", "regions", "region", "label"];

/// Read a label table into local label → name.
pub fn read_label_table<P: AsRef<Path>>(path: P) -> Result<BTreeMap<u32, String>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open label table {}", path.display()))?;

    let mut records = reader.records();
    let mut columns = (0, 1);
    let mut first_row = None;
    if let Some(record) = records.next() {
        let record = record.with_context(|| format!("Failed to parse {}", path.display()))?;
        match header_columns(&record).with_context(|| format!("Bad header in {}", path.display()))? {
            Some(found) => columns = found,
            None => first_row = Some(record),
        }
    }

    let mut names = BTreeMap::new();
    for record in first_row.into_iter().map(Ok).chain(records) {
        let record = record.with_context(|| format!("Failed to parse {}", path.display()))?;
        let line = record.position().map_or(0, |p| p.line());
        let (index, name) =
            parse_row(&record, columns).with_context(|| format!("{}:{}", path.display(), line))?;
        if names.insert(index, name).is_some() {
            bail!("{}:{}: duplicate label index {}", path.display(), line, index);
        }
    }
    Ok(names)
}

/// Column positions of `(index, name)` when `record` is a header row.
fn header_columns(record: &StringRecord) -> Result<Option<(usize, usize)>> {
    let first = record.get(0).unwrap_or_default();
    if first.parse::<u32>().is_ok() {
        return Ok(None);
    }

    let lowered: Vec<String> = record.iter().map(str::to_ascii_lowercase).collect();
    let index = lowered.iter().position(|field| field == INDEX_COLUMN);
    let name = lowered.iter().position(|field| NAME_COLUMNS.contains(&field.as_str()));
    match (index, name) {
        (Some(index), Some(name)) => Ok(Some((index, name))),
        _ => bail!(
            "expected an `{}` column and one of {:?}, found {:?}",
            INDEX_COLUMN,
            NAME_COLUMNS,
            lowered
        ),
    }
}

fn parse_row(record: &StringRecord, (index_col, name_col): (usize, usize)) -> Result<(u32, String)> {
    let raw_index = record.get(index_col).unwrap_or_default();
    let index: u32 = raw_index
        .parse()
        .with_context(|| format!("label index {:?} is not a non-negative integer", raw_index))?;
    if index == 0 {
        bail!("label index 0 is reserved for background");
    }
    let name = record.get(name_col).unwrap_or_default();
    if name.is_empty() {
        bail!("label {} has no name", index);
    }
    Ok((index, name.to_string()))
}

/// Atlas file name up to its first `.`, e.g. `cerebellum` for
/// `cerebellum.nii.gz`.
pub fn atlas_stem(atlas_path: &Path) -> String {
    let file_name = atlas_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => file_name,
    }
}

/// The label table expected next to an atlas: `<dir>/<stem>.tsv`.
pub fn sidecar_table_path(atlas_path: &Path) -> PathBuf {
    atlas_path.with_file_name(format!("{}.tsv", atlas_stem(atlas_path)))
}

/// Write the merged table to `path`.
pub fn write_label_table<P: AsRef<Path>>(path: P, table: &LabelTable) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_label_table_to(file, table).with_context(|| format!("Failed to write label table {}", path.display()))
}

/// Write the merged table to any writer.
pub fn write_label_table_to<W: Write>(writer: W, table: &LabelTable) -> Result<()> {
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    writer.write_record([INDEX_COLUMN, "name"])?;
    for entry in table.iter() {
        writer.write_record([entry.index.to_string().as_str(), entry.name.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reads_header_in_any_column_order() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "lut.tsv", "regions\tindex\nThalamus\t1\nCaudate\t2\n");
        let names = read_label_table(&path).unwrap();
        assert_eq!(names.get(&1).map(String::as_str), Some("Thalamus"));
        assert_eq!(names.get(&2).map(String::as_str), Some("Caudate"));
    }

    #[test]
    fn test_reads_headerless_rows_and_skips_comments() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "lut.tsv", "# cerebellar lobules\n3\tLobule III\n10\tVermis X\n");
        let names = read_label_table(&path).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[&10], "Vermis X");
    }

    #[test]
    fn test_rejects_bad_rows() {
        let dir = tempdir().unwrap();

        let duplicate = write(dir.path(), "dup.tsv", "index\tname\n1\tA\n1\tB\n");
        let err = read_label_table(&duplicate).unwrap_err();
        assert!(format!("{:#}", err).contains("duplicate label index 1"));

        let background = write(dir.path(), "zero.tsv", "index\tname\n0\tUnknown\n");
        assert!(read_label_table(&background).is_err());

        let negative = write(dir.path(), "neg.tsv", "index\tname\n-4\tA\n");
        assert!(read_label_table(&negative).is_err());

        let no_index = write(dir.path(), "cols.tsv", "id\tname\n1\tA\n");
        assert!(read_label_table(&no_index).is_err());
    }

    #[test]
    fn test_sidecar_path() {
        let atlas = Path::new("/data/atlases/cerebellum.nii.gz");
        assert_eq!(sidecar_table_path(atlas), PathBuf::from("/data/atlases/cerebellum.tsv"));
        assert_eq!(atlas_stem(Path::new("Tian_S2.nii")), "Tian_S2");
    }

    #[test]
    fn test_written_table_reads_back() {
        let mut table = LabelTable::new();
        table.push(1, "A_1").unwrap();
        table.push(4, "B_1").unwrap();

        let mut buffer = Vec::new();
        write_label_table_to(&mut buffer, &table).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "index\tname\n1\tA_1\n4\tB_1\n");

        let dir = tempdir().unwrap();
        let path = dir.path().join("merged.tsv");
        write_label_table(&path, &table).unwrap();
        let names = read_label_table(&path).unwrap();
        assert_eq!(names[&4], "B_1");
    }
}
