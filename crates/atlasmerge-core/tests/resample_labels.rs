use std::collections::BTreeSet;
use atlasmerge_core::filter::resample_labels;
use atlasmerge_core::image::ReferenceGrid;
use atlasmerge_core::merge::{AtlasInput, AtlasMerger, NameSource};
use atlasmerge_core::spatial::{Direction, Point, Spacing, Vector};
use atlasmerge_core::Image;
use burn_ndarray::NdArray;

type Backend = NdArray<f32>;

fn block_atlas(grid: &ReferenceGrid<3>, label_of: impl Fn(usize, usize, usize) -> f32) -> Image<Backend, 3> {
    let [nz, ny, nx] = grid.shape();
    let mut values = Vec::with_capacity(nz * ny * nx);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                values.push(label_of(x, y, z));
            }
        }
    }
    Image::from_values(values, grid, &Default::default()).unwrap()
}

#[test]
fn coarse_atlases_land_on_fine_reference() {
    // 1mm reference, 8mm cube centred on the origin
    let reference = ReferenceGrid::new(
        [8, 8, 8],
        Point::new([-3.5, -3.5, -3.5]),
        Spacing::uniform(1.0),
        Direction::identity(),
    )
    .unwrap();

    // 2mm "cortex": left half labelled 1, right half labelled 2
    let coarse = ReferenceGrid::new(
        [4, 4, 4],
        Point::new([-3.0, -3.0, -3.0]),
        Spacing::uniform(2.0),
        Direction::identity(),
    )
    .unwrap();
    let cortex = block_atlas(&coarse, |x, _, _| if x < 2 { 1.0 } else { 2.0 });

    // 1mm "cerebellum" already on the reference, bottom slab only
    let cerebellum = block_atlas(&reference, |_, _, z| if z == 0 { 1.0 } else { 0.0 });

    let cortex = resample_labels(cortex, &reference, 1e-4).unwrap();
    let cerebellum = resample_labels(cerebellum, &reference, 1e-4).unwrap();

    let merged = AtlasMerger::default()
        .merge(
            &reference,
            vec![
                AtlasInput { source: "cortex".into(), image: cortex, names: NameSource::Prefix("cortex".into()) },
                AtlasInput { source: "cerebellum".into(), image: cerebellum, names: NameSource::Prefix("cerebellum".into()) },
            ],
        )
        .unwrap();

    let labels = merged.labels().unwrap();
    let distinct: BTreeSet<u32> = labels.iter().copied().collect();
    // cortex covers the whole cube, so first-wins leaves no room for the cerebellum
    assert_eq!(distinct, BTreeSet::from([1, 2]));
    assert_eq!(merged.contributions[1].voxels_written, 0);
    assert_eq!(merged.contributions[1].voxels_overlapping, 64);
    assert_eq!(merged.table.len(), 3);
    assert_eq!(merged.table.name(3), Some("cerebellum_1"));

    // left half of the fine grid is label 1
    assert_eq!(labels[0], 1);
    assert_eq!(labels[7], 2);
}

#[test]
fn flipped_axes_resample_consistently() {
    // reference in LPS-like orientation: x and y axes point the other way
    let direction = Direction::from_axes([
        Vector::new([-1.0, 0.0, 0.0]),
        Vector::new([0.0, -1.0, 0.0]),
        Vector::new([0.0, 0.0, 1.0]),
    ]);
    let reference = ReferenceGrid::new([1, 1, 4], Point::new([3.0, 0.0, 0.0]), Spacing::uniform(1.0), direction).unwrap();

    // RAS atlas along x: physical x = 0, 1, 2, 3 labelled 1, 2, 3, 4
    let ras = ReferenceGrid::<3>::identity([1, 1, 4]).unwrap();
    let atlas = block_atlas(&ras, |x, _, _| (x + 1) as f32);

    let out = resample_labels(atlas, &reference, 1e-4).unwrap().to_values().unwrap();
    assert_eq!(out, vec![4.0, 3.0, 2.0, 1.0]);
}
