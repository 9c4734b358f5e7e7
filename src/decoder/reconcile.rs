//! Folding all visited directories into one main image description.

use crate::directory::Directory;

/// Picks the main image: the largest `width * height * bits_per_sample`
/// among directories that do not look like an embedded preview.
///
/// Ties go to the lowest index. When every directory is preview shaped the
/// largest of all wins, and when no directory has a volume at all the first
/// one does. `None` only for an empty list.
pub fn select_main(directories: &[Directory]) -> Option<usize> {
    largest(directories, |dir| !dir.is_thumbnail_shaped())
        .or_else(|| largest(directories, |_| true))
        .or(if directories.is_empty() { None } else { Some(0) })
}

fn largest(directories: &[Directory], eligible: impl Fn(&Directory) -> bool) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (index, dir) in directories.iter().enumerate() {
        let volume = dir.pixel_volume();
        if volume == 0 || !eligible(dir) {
            continue;
        }
        match best {
            Some((_, best_volume)) if best_volume >= volume => {}
            _ => best = Some((index, volume)),
        }
    }
    best.map(|(index, _)| index)
}

/// Copies `directories[main]` and fills each of its unset descriptive fields
/// from the first other directory, in visiting order, that has it.
///
/// Geometry is never taken from another directory.
pub fn merge(directories: &[Directory], main: usize) -> Directory {
    let mut merged = directories[main].clone();
    for (index, source) in directories.iter().enumerate() {
        if index == main {
            continue;
        }
        for backfill in BACKFILL {
            backfill(&mut merged, source);
        }
    }
    merged
}

fn fill<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if target.is_none() {
        target.clone_from(source);
    }
}

type Backfill = fn(&mut Directory, &Directory);

const BACKFILL: &[Backfill] = &[
    |t, s| fill(&mut t.frame.orientation, &s.frame.orientation),
    |t, s| fill(&mut t.exif.make, &s.exif.make),
    |t, s| fill(&mut t.exif.model, &s.exif.model),
    |t, s| fill(&mut t.exif.software, &s.exif.software),
    |t, s| fill(&mut t.exif.artist, &s.exif.artist),
    |t, s| fill(&mut t.exif.copyright, &s.exif.copyright),
    |t, s| fill(&mut t.exif.focal_length, &s.exif.focal_length),
    |t, s| fill(&mut t.exif.exposure_time, &s.exif.exposure_time),
    |t, s| fill(&mut t.exif.f_number, &s.exif.f_number),
    |t, s| fill(&mut t.exif.iso, &s.exif.iso),
    |t, s| fill(&mut t.exif.image_count, &s.exif.image_count),
    |t, s| fill(&mut t.exif.shutter_count, &s.exif.shutter_count),
    |t, s| fill(&mut t.exif.serial_number, &s.exif.serial_number),
    |t, s| fill(&mut t.exif.lens, &s.exif.lens),
    |t, s| fill(&mut t.exif.icc_profile, &s.exif.icc_profile),
    |t, s| fill(&mut t.exif.gps.version, &s.exif.gps.version),
    |t, s| fill(&mut t.exif.gps.latitude_ref, &s.exif.gps.latitude_ref),
    |t, s| fill(&mut t.exif.gps.latitude, &s.exif.gps.latitude),
    |t, s| fill(&mut t.exif.gps.longitude_ref, &s.exif.gps.longitude_ref),
    |t, s| fill(&mut t.exif.gps.longitude, &s.exif.gps.longitude),
    |t, s| fill(&mut t.exif.date_time, &s.exif.date_time),
    |t, s| fill(&mut t.exif.date_time_text, &s.exif.date_time_text),
    |t, s| fill(&mut t.util.cfa_pattern, &s.util.cfa_pattern),
    |t, s| fill(&mut t.util.white_balance, &s.util.white_balance),
    |t, s| fill(&mut t.util.black_levels, &s.util.black_levels),
    |t, s| fill(&mut t.util.color_balance_version, &s.util.color_balance_version),
    |t, s| fill(&mut t.meta_offset, &s.meta_offset),
    |t, s| fill(&mut t.tile_offset, &s.tile_offset),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::stream::ByteOrder;
    use crate::directory::{DirectoryOrigin, FixedText};

    fn frame(index: usize, width: u32, height: u32, bps: u16, samples: u16) -> Directory {
        let mut dir = Directory::new(
            index,
            8,
            0,
            DirectoryOrigin::Chain,
            ByteOrder::LittleEndian,
        );
        dir.frame.width = Some(width);
        dir.frame.height = Some(height);
        dir.frame.bits_per_sample = Some(bps);
        dir.frame.samples_per_pixel = Some(samples);
        dir
    }

    #[test]
    fn raw_frame_wins_and_takes_make_from_preview() {
        let raw = frame(0, 4000, 3000, 14, 3);
        let mut preview = frame(1, 160, 120, 6, 3);
        preview.exif.make = FixedText::from_bytes(b"Nikon");

        let directories = [raw, preview];
        let main = select_main(&directories).unwrap();
        assert_eq!(main, 0);

        let merged = merge(&directories, main);
        assert_eq!(merged.frame.width, Some(4000));
        assert_eq!(merged.frame.height, Some(3000));
        assert_eq!(merged.frame.bits_per_sample, Some(14));
        assert_eq!(merged.exif.make, FixedText::from_bytes(b"Nikon"));
    }

    #[test]
    fn preview_shape_is_excluded_even_when_larger() {
        let directories = [frame(0, 640, 480, 8, 3), frame(1, 8000, 6000, 6, 3)];
        assert_eq!(select_main(&directories), Some(0));
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        let directories = [
            frame(0, 10, 10, 8, 1),
            frame(1, 20, 20, 8, 1),
            frame(2, 20, 20, 8, 3),
        ];
        assert_eq!(select_main(&directories), Some(1));
    }

    #[test]
    fn all_previews_fall_back_to_the_largest() {
        let directories = [frame(0, 160, 120, 6, 3), frame(1, 640, 480, 6, 3)];
        assert_eq!(select_main(&directories), Some(1));
    }

    #[test]
    fn no_geometry_falls_back_to_the_first() {
        let empty = |index| {
            Directory::new(index, 8, 0, DirectoryOrigin::Chain, ByteOrder::BigEndian)
        };
        assert_eq!(select_main(&[empty(0), empty(1)]), Some(0));
        assert_eq!(select_main(&[]), None);
    }

    #[test]
    fn first_set_source_wins_and_main_is_never_overwritten() {
        let mut main = frame(0, 4000, 3000, 14, 1);
        main.exif.iso = Some(100);
        let mut first = frame(1, 160, 120, 8, 3);
        first.exif.iso = Some(800);
        first.exif.exposure_time = Some(0.004);
        first.frame.orientation = Some(6);
        let mut second = frame(2, 160, 120, 8, 3);
        second.exif.exposure_time = Some(1.0);
        second.exif.focal_length = Some(0.0);

        let merged = merge(&[main, first, second], 0);
        assert_eq!(merged.exif.iso, Some(100));
        assert_eq!(merged.exif.exposure_time, Some(0.004));
        assert_eq!(merged.exif.focal_length, Some(0.0));
        assert_eq!(merged.frame.orientation, Some(6));
        assert_eq!(merged.frame.samples_per_pixel, Some(1));
        assert_eq!(merged.index, 0);
    }
}
