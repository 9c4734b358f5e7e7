extern crate rawmeta;

use rawmeta::decoder::{Decoder, Limits};

use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TIFF-based RAW file such as a NEF
    #[arg(required = true)]
    path: PathBuf,

    /// Maximum number of directories to visit
    #[arg(long, default_value_t = 8)]
    max_directories: usize,

    /// List every directory, not only the reconciled main image
    #[arg(short, long)]
    all: bool,
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();
    let args = Cli::parse();

    let file = File::open(&args.path).expect("Cannot open raw file");
    let mut limits = Limits::default();
    limits.max_directories = args.max_directories;
    let mut decoder = Decoder::new(BufReader::new(file))
        .expect("Cannot create decoder")
        .with_limits(limits);
    let meta = decoder.decode().expect("Unable to read raw metadata");

    println!("byte order: {:?}", meta.byte_order);
    if args.all {
        for dir in &meta.directories {
            println!(
                "#{} {:?} at {} depth {}: {:?}",
                dir.index, dir.origin, dir.offset, dir.depth, dir.frame
            );
        }
    }
    println!("main image: directory {}", meta.main_index);
    println!("{:#?}", meta.main.frame);
    println!("{:#?}", meta.main.exif);
    println!("{:#?}", meta.main.util);
    for warning in &meta.warnings {
        println!("warning: {}", warning);
    }
}
