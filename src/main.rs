use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "pixova-overlay",
    version,
    about = "Composite brand text onto logo images"
)]
struct Cli {
    /// Image to overlay (path, http(s) URL, or data URL). Repeat for variations
    #[arg(short = 'i', long = "image")]
    images: Vec<String>,

    /// Text to draw
    #[arg(short = 't', long = "text")]
    text: Option<String>,

    /// Visual style used to pick a font family (see --show-styles)
    #[arg(short = 's', long = "style")]
    style: Option<String>,

    /// CSS-style font family list (overrides --style)
    #[arg(long = "font-family")]
    font_family: Option<String>,

    /// Requested font size in px (default: derived from the image height)
    #[arg(long = "font-size")]
    font_size: Option<f32>,

    /// Fill colour (default: suggested from image brightness)
    #[arg(short = 'c', long = "color")]
    color: Option<String>,

    /// top, center, bottom or custom
    #[arg(short = 'p', long = "position")]
    position: Option<String>,

    /// Anchor x for --position custom
    #[arg(long = "custom-x")]
    custom_x: Option<f32>,

    /// Anchor y for --position custom
    #[arg(long = "custom-y")]
    custom_y: Option<f32>,

    /// Outline colour; the outline is drawn when this and --stroke-width are set
    #[arg(long = "stroke-color")]
    stroke_color: Option<String>,

    #[arg(long = "stroke-width")]
    stroke_width: Option<f32>,

    /// Draw a filled box behind the text
    #[arg(long = "background-color")]
    background_color: Option<String>,

    /// Box padding in px (default: 20)
    #[arg(long = "background-padding")]
    background_padding: Option<f32>,

    /// Output file, or directory / file stem when several images are given
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Print PNG data URLs instead of writing files
    #[arg(long = "data-url")]
    data_url: bool,

    /// Print the computed layout as JSON instead of writing files
    #[arg(long = "explain")]
    explain: bool,

    /// Show style names with their font families and exit
    #[arg(long = "show-styles")]
    show_styles: bool,

    /// Run the HTTP API on ADDR (e.g. 127.0.0.1:8787)
    #[arg(long = "server", value_name = "ADDR", num_args = 0..=1, default_missing_value = "")]
    server: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    pixova_overlay::logging::init(cli.verbose)?;

    if let Some(addr) = cli.server {
        let settings_path = cli.read_settings.as_deref().map(std::path::Path::new);
        let settings = pixova_overlay::settings::load_settings(settings_path)?;
        let addr = if addr.trim().is_empty() {
            settings.server_addr.clone()
        } else {
            addr
        };
        return pixova_overlay::server::run_server(settings, addr).await;
    }

    let output = pixova_overlay::run(pixova_overlay::Config {
        images: cli.images,
        text: cli.text,
        style: cli.style,
        font_family: cli.font_family,
        font_size: cli.font_size,
        color: cli.color,
        position: cli.position,
        custom_x: cli.custom_x,
        custom_y: cli.custom_y,
        stroke_color: cli.stroke_color,
        stroke_width: cli.stroke_width,
        background_color: cli.background_color,
        background_padding: cli.background_padding,
        output: cli.output,
        data_url: cli.data_url,
        explain: cli.explain,
        show_styles: cli.show_styles,
        settings_path: cli.read_settings,
    })
    .await?;

    println!("{}", output);
    Ok(())
}
