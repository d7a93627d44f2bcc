use anyhow::{anyhow, Context, Result};
use atlasmerge_core::image::{Image, ReferenceGrid};
use atlasmerge_core::merge::LabelWidth;
use atlasmerge_core::spatial::{Direction, Point, Spacing, Vector};
use burn::tensor::backend::Backend;
use ndarray::{Array3, ArrayD, Axis, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;
use tracing::{debug, warn};

/// Read a 3-D NIfTI volume as an image in `[Z, Y, X]` tensor order.
///
/// Pseudo 4-D files of shape `(x, y, z, 1)` are accepted.
pub fn read_nifti<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Image<B, 3>> {
    let path = path.as_ref();
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("Failed to read NIfTI file {}", path.display()))?;
    let header = obj.header().clone();

    let volume = obj
        .into_volume()
        .into_ndarray::<f32>()
        .with_context(|| format!("Failed to convert volume of {} to ndarray", path.display()))?;
    let volume = squeeze_to_3d(volume, path)?;
    let (nx, ny, nz) = volume.dim();

    let grid = grid_from_header(&header, [nx, ny, nz], path)?;

    // Logical [Z, Y, X] iteration yields the C-order buffer burn expects,
    // whatever the memory layout nifti handed back.
    let values: Vec<f32> = volume.permuted_axes([2, 1, 0]).iter().copied().collect();
    debug!(path = %path.display(), shape = ?grid.shape(), "read NIfTI volume");

    Ok(Image::from_values(values, &grid, device)?)
}

/// Read only the sampling grid of a NIfTI file.
pub fn read_grid<P: AsRef<Path>>(path: P) -> Result<ReferenceGrid<3>> {
    let path = path.as_ref();
    let header = NiftiHeader::from_file(path)
        .with_context(|| format!("Failed to read NIfTI header of {}", path.display()))?;

    let ndim = header.dim[0] as usize;
    if !(1..=7).contains(&ndim) {
        anyhow::bail!("Invalid dimension count {} in {}", ndim, path.display());
    }
    let mut dims: Vec<usize> = header.dim[1..=ndim].iter().map(|&d| d as usize).collect();
    while dims.len() > 3 && dims.last() == Some(&1) {
        dims.pop();
    }
    if dims.len() != 3 {
        anyhow::bail!("Expected a 3-D volume in {}, found shape {:?}", path.display(), dims);
    }

    grid_from_header(&header, [dims[0], dims[1], dims[2]], path)
}

/// Write a label image with an unsigned integer datatype of `width`.
///
/// The sform carries the image geometry; the qform is left unset.
pub fn write_label_nifti<B: Backend, P: AsRef<Path>>(path: P, image: &Image<B, 3>, width: LabelWidth) -> Result<()> {
    let path = path.as_ref();
    let values = image.to_values()?;
    let header = header_for_grid(image.grid());
    let shape = image.shape();

    let written = match width {
        LabelWidth::U8 => {
            let array = to_nifti_order(values.iter().map(|&v| v as u8).collect(), shape)?;
            WriterOptions::new(path).reference_header(&header).write_nifti(&array)
        }
        LabelWidth::U16 => {
            let array = to_nifti_order(values.iter().map(|&v| v as u16).collect(), shape)?;
            WriterOptions::new(path).reference_header(&header).write_nifti(&array)
        }
        LabelWidth::U32 => {
            let array = to_nifti_order(values.iter().map(|&v| v as u32).collect(), shape)?;
            WriterOptions::new(path).reference_header(&header).write_nifti(&array)
        }
    };
    written.map_err(|e| anyhow!("Failed to write NIfTI file {}: {}", path.display(), e))?;

    debug!(path = %path.display(), bits = width.bits(), "wrote label volume");
    Ok(())
}

/// `[Z, Y, X]` buffer to a standard-layout `(x, y, z)` array.
fn to_nifti_order<T: Clone>(values: Vec<T>, shape: [usize; 3]) -> Result<Array3<T>> {
    let [nz, ny, nx] = shape;
    let zyx = Array3::from_shape_vec((nz, ny, nx), values).context("Voxel count does not match image shape")?;
    Ok(zyx.permuted_axes([2, 1, 0]).as_standard_layout().into_owned())
}

fn squeeze_to_3d(mut volume: ArrayD<f32>, path: &Path) -> Result<Array3<f32>> {
    while volume.ndim() > 3 && volume.shape()[volume.ndim() - 1] == 1 {
        let last = volume.ndim() - 1;
        volume = volume.index_axis_move(Axis(last), 0);
    }
    let shape = volume.shape().to_vec();
    volume
        .into_dimensionality::<Ix3>()
        .map_err(|_| anyhow!("Expected a 3-D volume in {}, found shape {:?}", path.display(), shape))
}

/// Voxel-to-world rows `[r0, r1, r2]` from sform, qform or pixdim.
fn header_affine(header: &NiftiHeader) -> [[f64; 4]; 3] {
    let widen = |row: [f32; 4]| row.map(f64::from);

    if header.sform_code > 0 {
        return [widen(header.srow_x), widen(header.srow_y), widen(header.srow_z)];
    }

    let pixdim = header.pixdim.map(f64::from);
    if header.qform_code > 0 {
        let b = f64::from(header.quatern_b);
        let c = f64::from(header.quatern_c);
        let d = f64::from(header.quatern_d);
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();
        let qfac = if pixdim[0] < 0.0 { -1.0 } else { 1.0 };

        let r = [
            [a * a + b * b - c * c - d * d, 2.0 * (b * c - a * d), 2.0 * (b * d + a * c)],
            [2.0 * (b * c + a * d), a * a + c * c - b * b - d * d, 2.0 * (c * d - a * b)],
            [2.0 * (b * d - a * c), 2.0 * (c * d + a * b), a * a + d * d - b * b - c * c],
        ];
        let scale = [pixdim[1], pixdim[2], pixdim[3] * qfac];
        let offset = [header.quatern_x, header.quatern_y, header.quatern_z].map(f64::from);

        return std::array::from_fn(|row| {
            [r[row][0] * scale[0], r[row][1] * scale[1], r[row][2] * scale[2], offset[row]]
        });
    }

    [
        [pixdim[1], 0.0, 0.0, 0.0],
        [0.0, pixdim[2], 0.0, 0.0],
        [0.0, 0.0, pixdim[3], 0.0],
    ]
}

fn grid_from_header(header: &NiftiHeader, shape_xyz: [usize; 3], path: &Path) -> Result<ReferenceGrid<3>> {
    let affine = header_affine(header);
    let origin = Point::new([affine[0][3], affine[1][3], affine[2][3]]);

    let columns: [Vector<3>; 3] = std::array::from_fn(|c| Vector::new([affine[0][c], affine[1][c], affine[2][c]]));
    let norms = columns.map(|column| column.norm());

    let axes: [Vector<3>; 3] = std::array::from_fn(|c| {
        if norms[c] > 1e-9 {
            columns[c] / norms[c]
        } else {
            let mut unit = Vector::zeros();
            unit[c] = 1.0;
            unit
        }
    });
    if norms.iter().any(|&n| !(n > 1e-9 && n.is_finite())) {
        warn!(path = %path.display(), spacing = ?norms, "degenerate voxel spacing, using 1 mm");
    }
    let spacing = Spacing::new(norms.map(|n| if n > 1e-9 && n.is_finite() { n } else { 1.0 }));

    let [nx, ny, nz] = shape_xyz;
    ReferenceGrid::new([nz, ny, nx], origin, spacing, Direction::from_axes(axes))
        .with_context(|| format!("Invalid geometry in {}", path.display()))
}

fn header_for_grid(grid: &ReferenceGrid<3>) -> NiftiHeader {
    let spacing = grid.spacing();
    let direction = grid.direction();
    let origin = grid.origin();

    let row = |r: usize| -> [f32; 4] {
        [
            (direction[(r, 0)] * spacing[0]) as f32,
            (direction[(r, 1)] * spacing[1]) as f32,
            (direction[(r, 2)] * spacing[2]) as f32,
            origin[r] as f32,
        ]
    };

    NiftiHeader {
        pixdim: [1.0, spacing[0] as f32, spacing[1] as f32, spacing[2] as f32, 1.0, 1.0, 1.0, 1.0],
        srow_x: row(0),
        srow_y: row(1),
        srow_z: row(2),
        sform_code: 1,
        qform_code: 0,
        ..NiftiHeader::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use burn_ndarray::NdArray;
    use nifti::NiftiType;
    use tempfile::tempdir;

    type TestBackend = NdArray<f32>;

    fn header_with_sform(rows: [[f32; 4]; 3]) -> NiftiHeader {
        NiftiHeader {
            srow_x: rows[0],
            srow_y: rows[1],
            srow_z: rows[2],
            sform_code: 2,
            ..NiftiHeader::default()
        }
    }

    #[test]
    fn test_read_nifti_orders_axes_zyx() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("ramp.nii");

        // value = x + 10 y + 100 z on a (3, 4, 5) volume
        let array = Array3::from_shape_fn((3, 4, 5), |(x, y, z)| (x + 10 * y + 100 * z) as f32);
        WriterOptions::new(&file_path).write_nifti(&array)?;

        let device = Default::default();
        let image = read_nifti::<TestBackend, _>(&file_path, &device)?;
        assert_eq!(image.shape(), [5, 4, 3]);

        let values = image.to_values()?;
        let at = |z: usize, y: usize, x: usize| values[(z * 4 + y) * 3 + x];
        assert_eq!(at(0, 0, 1), 1.0);
        assert_eq!(at(0, 2, 0), 20.0);
        assert_eq!(at(4, 3, 2), 432.0);
        Ok(())
    }

    #[test]
    fn test_read_nifti_uses_sform() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("lps.nii.gz");

        let header = header_with_sform([[-2.0, 0.0, 0.0, 90.0], [0.0, 2.0, 0.0, -126.0], [0.0, 0.0, 3.0, -72.0]]);
        let array = Array3::<u8>::zeros((4, 4, 4));
        WriterOptions::new(&file_path).reference_header(&header).write_nifti(&array)?;

        let grid = read_grid(&file_path)?;
        assert_eq!(grid.shape(), [4, 4, 4]);
        assert!(grid.origin().approx_eq(&Point::new([90.0, -126.0, -72.0]), 1e-6));
        assert!(grid.spacing().approx_eq(&Spacing::new([2.0, 2.0, 3.0]), 1e-6));
        assert_eq!(grid.direction()[(0, 0)], -1.0);
        assert_eq!(grid.direction()[(1, 1)], 1.0);
        Ok(())
    }

    #[test]
    fn test_qform_rotation() {
        // 180 degrees about z: quaternion (0, 0, 0, 1)
        let header = NiftiHeader {
            qform_code: 1,
            sform_code: 0,
            quatern_b: 0.0,
            quatern_c: 0.0,
            quatern_d: 1.0,
            quatern_x: 5.0,
            quatern_y: 6.0,
            quatern_z: 7.0,
            pixdim: [1.0, 2.0, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0],
            ..NiftiHeader::default()
        };
        let affine = header_affine(&header);
        assert!((affine[0][0] + 2.0).abs() < 1e-9);
        assert!((affine[1][1] + 2.0).abs() < 1e-9);
        assert!((affine[2][2] - 2.0).abs() < 1e-9);
        assert_eq!([affine[0][3], affine[1][3], affine[2][3]], [5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_pseudo_4d_is_squeezed() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("pseudo4d.nii");

        let array = ndarray::Array4::from_shape_fn((2, 3, 4, 1), |(x, y, z, _)| (x + y + z) as f32);
        WriterOptions::new(&file_path).write_nifti(&array)?;

        let device = Default::default();
        let image = read_nifti::<TestBackend, _>(&file_path, &device)?;
        assert_eq!(image.shape(), [4, 3, 2]);
        assert_eq!(read_grid(&file_path)?.shape(), [4, 3, 2]);
        Ok(())
    }

    #[test]
    fn test_true_4d_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("timeseries.nii");

        let array = ndarray::Array4::<f32>::zeros((2, 2, 2, 3));
        WriterOptions::new(&file_path).write_nifti(&array)?;

        let device = Default::default();
        let err = read_nifti::<TestBackend, _>(&file_path, &device).unwrap_err();
        assert!(err.to_string().contains("3-D"));
        assert!(read_grid(&file_path).is_err());
        Ok(())
    }

    #[test]
    fn test_write_label_nifti_keeps_geometry_and_width() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("labels.nii.gz");
        let device = Default::default();

        let grid = ReferenceGrid::new(
            [2, 3, 4],
            Point::new([-10.0, 20.0, 5.0]),
            Spacing::new([1.5, 1.5, 2.0]),
            Direction::from_axes([
                Vector::new([-1.0, 0.0, 0.0]),
                Vector::new([0.0, -1.0, 0.0]),
                Vector::new([0.0, 0.0, 1.0]),
            ]),
        )?;
        let values: Vec<f32> = (0..24).map(|v| (v * 20) as f32).collect();
        let image = Image::<TestBackend, 3>::from_values(values.clone(), &grid, &device)?;

        write_label_nifti(&file_path, &image, LabelWidth::U16)?;

        let obj = ReaderOptions::new().read_file(&file_path)?;
        assert_eq!(obj.header().data_type()?, NiftiType::Uint16);
        assert_eq!(obj.header().sform_code, 1);

        let back = read_nifti::<TestBackend, _>(&file_path, &device)?;
        assert!(back.grid().matches(&grid, 1e-4));
        assert_eq!(back.to_values()?, values);
        Ok(())
    }
}
