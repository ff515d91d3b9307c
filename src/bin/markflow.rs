use clap::Parser;
use markflow::config::MarkdownConfig;
use markflow::draw_context::MonospaceMetrics;
use markflow::link_opener::{LinkOpener, RecordingOpener, SystemBrowser};
use markflow::richtext::MarkdownView;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "markflow")]
#[command(about = "Lay out a markdown file and print the wrapped lines", long_about = None)]
struct Args {
    /// Markdown file to lay out
    file: PathBuf,

    /// Available width in layout units
    #[arg(short, long, default_value_t = 320.0)]
    width: f32,

    /// Config file (defaults to markflow.toml in the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Center every line
    #[arg(long)]
    centered: bool,

    /// Treat soft breaks as line breaks
    #[arg(long)]
    soft_break_newline: bool,

    /// Glyph advance of the monospace metrics at scale 1
    #[arg(long, default_value_t = 6.0)]
    advance: f32,

    /// Resolve the cursor under a pointer position
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    at: Option<Vec<f32>>,

    /// Open the link under the --at position in the default browser
    #[arg(long, requires = "at")]
    open: bool,
}

fn load_config(args: &Args) -> Result<MarkdownConfig, String> {
    let mut config = match &args.config {
        Some(path) => MarkdownConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {}", path.display(), e))?,
        None => MarkdownConfig::default_path()
            .map(|path| MarkdownConfig::load_or_default(&path))
            .unwrap_or_default(),
    };

    if args.centered {
        config.paragraph.centered = true;
    }
    if args.soft_break_newline {
        config.paragraph.soft_break_is_newline = true;
    }
    Ok(config)
}

fn run(args: Args) -> Result<(), String> {
    let config = load_config(&args)?;
    let markdown = fs::read_to_string(&args.file)
        .map_err(|e| format!("Failed to read '{}': {}", args.file.display(), e))?;
    let metrics = MonospaceMetrics::new(args.advance);

    let mut view = MarkdownView::from_markdown(&markdown, config);
    view.layout(0.0, 0.0, args.width, &metrics)
        .map_err(|e| format!("Layout failed: {}", e))?;

    for paragraph in view.paragraphs() {
        for line in paragraph.visual_lines() {
            println!("{}: {}", line.y, line.text);
        }
    }

    let Some(at) = &args.at else {
        return Ok(());
    };
    let &[x, y] = at.as_slice() else {
        return Err("--at takes exactly two values".to_string());
    };

    let mut recording = RecordingOpener::default();
    let mut browser = SystemBrowser;
    let opener: &mut dyn LinkOpener = if args.open {
        &mut browser
    } else {
        &mut recording
    };
    let position = view
        .cursor_at(x, y, false, &metrics, opener)
        .map_err(|e| format!("Hit test failed: {}", e))?;

    println!(
        "cursor: paragraph {} run {} offset {}",
        position.paragraph, position.cursor.run, position.cursor.offset
    );
    view.hover(x, y);
    if let Some(link) = view.hovered_link() {
        println!("link: {}", link);
    }
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
