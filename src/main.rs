use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::fs;
use std::path::{Path, PathBuf};
use xiangqi_scan::render::comparison_sheet;
use xiangqi_scan::{
    Board, GeometryPolicy, OverlayRenderer, ScanConfig, ScanResult, TemplateCatalog, cell, scan,
    scan_annotated,
};

const BANNER: &str = "========================================";

fn cli() -> Command {
    Command::new("xiangqi-scan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reads a Xiangqi board position from a screenshot")
        .arg(
            Arg::new("image")
                .value_name("IMAGE")
                .help("Screenshot of the board")
                .default_value("image.png")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Scan config JSON (defaults are used if it does not exist)")
                .default_value("scan_config.json")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("templates")
                .long("templates")
                .value_name("DIR")
                .help("Directory with the 14 piece templates")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("threshold")
                .long("threshold")
                .value_name("SCORE")
                .help("Minimum match score in [0, 1]")
                .value_parser(value_parser!(f32)),
        )
        .arg(
            Arg::new("geometry")
                .long("geometry")
                .value_name("POLICY")
                .help("How the reference layout is scaled onto the capture")
                .value_parser(["uniform", "aspect-fit"]),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Report every cell")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug-image")
                .long("debug-image")
                .value_name("PATH")
                .help("Write the annotated overlay PNG")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .value_name("PATH")
                .help("Write the full scan result as JSON")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dump-low-confidence")
                .long("dump-low-confidence")
                .value_name("DIR")
                .help("Write crop/template comparison sheets for weak detections")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("expect")
                .long("expect")
                .value_name("POSITION")
                .help("Fail unless the scan reads this position"),
        )
        .arg(
            Arg::new("write-default-config")
                .long("write-default-config")
                .value_name("PATH")
                .help("Write the default config to PATH and exit")
                .value_parser(value_parser!(PathBuf)),
        )
}

/// Relative template directories are looked up next to the config file.
fn resolve_template_dir(config_path: &Path, template_dir: &Path) -> PathBuf {
    if template_dir.is_absolute() || !config_path.exists() {
        return template_dir.to_path_buf();
    }
    match config_path.parent() {
        Some(base) if !base.as_os_str().is_empty() => base.join(template_dir),
        _ => template_dir.to_path_buf(),
    }
}

fn load_config(matches: &ArgMatches) -> Result<ScanConfig> {
    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("scan_config.json"));
    let mut config = ScanConfig::load(&config_path)?;
    config.template_dir = resolve_template_dir(&config_path, &config.template_dir);

    if let Some(dir) = matches.get_one::<PathBuf>("templates") {
        config.template_dir = dir.clone();
    }
    if let Some(&threshold) = matches.get_one::<f32>("threshold") {
        config.threshold = threshold;
    }
    if let Some(policy) = matches.get_one::<String>("geometry") {
        config.geometry = policy.parse::<GeometryPolicy>().map_err(anyhow::Error::msg)?;
    }
    config.validate()?;
    Ok(config)
}

fn dump_low_confidence(
    dir: &Path,
    image: &image::RgbImage,
    templates: &TemplateCatalog,
    result: &ScanResult,
    ceiling: f32,
) -> Result<()> {
    let scaled = templates.at_scale(result.geometry.scale);
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    for report in result.low_confidence(ceiling) {
        let (Some(region), Some(piece)) = (report.region, report.detection.piece) else {
            continue;
        };
        let Some(entry) = scaled.get(piece) else { continue };
        let crop = cell::extract(image, &region);
        let sheet = comparison_sheet(&crop, &entry.image, report.detection.confidence);
        let stem = piece.template_file().trim_end_matches(".png").to_string();
        let path = dir.join(format!("cell_{}_{}_{}.png", report.row, report.col, stem));
        sheet
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::warn!(
            "[{},{}] '{}' accepted with low score ({:.2}%), comparison saved to {}",
            report.row,
            report.col,
            piece,
            report.detection.confidence * 100.0,
            path.display()
        );
    }
    Ok(())
}

fn check_expected(expected: &str, board: &Board) -> Result<()> {
    let expected_board = Board::from_position(expected)
        .with_context(|| format!("Malformed expected position '{}'", expected))?;
    let diff = board.diff(&expected_board);
    for (row, col, got, want) in &diff {
        let show = |p: &Option<xiangqi_scan::Piece>| p.map(|p| p.code()).unwrap_or('.');
        log::error!("[{},{}] read '{}', expected '{}'", row, col, show(got), show(want));
    }
    if !diff.is_empty() {
        bail!("Scan disagrees with expected position in {} cells", diff.len());
    }
    println!("[OK] Matches expected position.");
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let verbose = matches.get_flag("verbose");

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "info" }),
    )
    .init();

    if let Some(path) = matches.get_one::<PathBuf>("write-default-config") {
        ScanConfig::default().save(path)?;
        println!("Default config written to {}", path.display());
        return Ok(());
    }

    let config = load_config(&matches)?;
    let image_path = matches
        .get_one::<PathBuf>("image")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("image.png"));

    let image = image::open(&image_path)
        .with_context(|| format!("Could not open '{}', no board could be read", image_path.display()))?
        .to_rgb8();

    log::info!("Loading templates from {}...", config.template_dir.display());
    let templates = TemplateCatalog::load(&config.template_dir);
    let missing = templates.missing();
    if !missing.is_empty() {
        let codes: String = missing.iter().map(|p| p.code()).collect();
        log::warn!("{} templates missing ({}); those pieces cannot be detected", missing.len(), codes);
    }

    let debug_image = matches.get_one::<PathBuf>("debug-image");
    let result = match debug_image {
        Some(_) => scan_annotated(&image, &templates, &config, verbose, &OverlayRenderer::default()),
        None => scan(&image, &templates, &config, verbose),
    }
    .context("Failed to scan board")?;

    println!();
    println!("{}", BANNER);
    println!(" FINAL RESULT (FEN)");
    println!("{}", BANNER);
    println!("{}", result.full_position());
    println!("{}", BANNER);

    if let (Some(path), Some(annotated)) = (debug_image, result.annotated.as_ref()) {
        annotated
            .save(path)
            .with_context(|| format!("Failed to save debug image to {}", path.display()))?;
        println!("Debug overlay written to {}", path.display());
    }

    if let Some(path) = matches.get_one::<PathBuf>("json") {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize scan result")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Scan result written to {}", path.display());
    }

    if let Some(dir) = matches.get_one::<PathBuf>("dump-low-confidence") {
        dump_low_confidence(dir, &image, &templates, &result, config.low_confidence_ceiling)?;
    }

    if let Some(expected) = matches.get_one::<String>("expect") {
        check_expected(expected, &result.board)?;
    }

    Ok(())
}
