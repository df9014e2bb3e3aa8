use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fotografiska_core::{PlacementReport, ProcessOptions, SidecarNaming};

const AFTER_HELP: &str = "\
fotografiska sorts your photos and videos into year and month folders that are
easy to browse with a regular file manager. Each filename starts with the date
the file was taken and includes a hash of its first 10MB, so a damaged copy is
detected and replaced on the next run.

For example, given

    DSCF4325.JPG (taken 2021/01/01 05:23:11 +01:00)
    DSCF1234.JPG (taken 2020/08/27 11:00:00 +01:00)

running

    fotografiska --src-dir ~/Downloads/photos --dst-dir ~/Pictures

produces

    2020/08/2020.08.27_11.00.00+0100-b46976ab6907346a-DSCF1234.JPG
    2021/01/2021.01.01_05.23.11+0100-66f4c6bbab77a615-DSCF4325.JPG

The date comes from EXIF data when there is any, then from a name given by an
earlier run, then from the file's creation or modification time. Sidecar files
such as .xmp keep their name.

Running again over the same folders copies nothing new. Files without EXIF data
whose modification time was reset by copying can't be dated correctly. Keep a
backup of your photos before running.";

#[derive(Parser)]
#[command(
    name = "fotografiska",
    version,
    about = "Organize photos and videos into a dated, hash-named directory tree",
    after_help = AFTER_HELP
)]
struct Cli {
    /// Folder containing images/videos to read
    #[arg(long, alias = "srcDir")]
    src_dir: PathBuf,

    /// Existing folder to copy the images/videos into
    #[arg(long, alias = "dstDir")]
    dst_dir: PathBuf,

    /// Print what would be done without changing anything
    #[arg(long, alias = "dryRun")]
    dry_run: bool,

    /// Only read files directly inside --src-dir
    #[arg(long)]
    flat: bool,

    /// Prefix sidecar filenames with the timestamp (older naming)
    #[arg(long)]
    timestamped_sidecars: bool,

    /// Print one JSON object per file instead of a text line
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    let t_total = std::time::Instant::now();

    let options = ProcessOptions {
        source_dir: cli.src_dir,
        destination_dir: cli.dst_dir,
        dry_run: cli.dry_run,
        recursive: !cli.flat,
        sidecar_naming: if cli.timestamped_sidecars {
            SidecarNaming::Timestamped
        } else {
            SidecarNaming::Bare
        },
    };
    log::debug!("Options: {:?}", options);

    let json = cli.json;
    let result = fotografiska_core::process(&options, &mut |report: &PlacementReport| {
        if json {
            match serde_json::to_string(report) {
                Ok(line) => println!("{}", line),
                Err(e) => log::error!("Failed to serialize report: {}", e),
            }
        } else {
            println!("{}", report);
        }
    })
    .with_context(|| {
        format!(
            "Failed to organize {} into {}",
            options.source_dir.display(),
            options.destination_dir.display()
        )
    })?;

    log::info!(
        "Done! {} ({:.2}s)",
        result,
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
