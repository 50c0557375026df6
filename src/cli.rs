use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "ref-dl")]
#[command(author, version, about = "Sequential reference-image downloader", long_about = None)]
pub struct Args {
    /// Manifest listing the images to fetch (TSV `name<TAB>url`, or a JSON
    /// array of {file_name, url} objects when the path ends in .json)
    #[arg(short = 'l', long, default_value = "ref_links.txt")]
    pub link_file: String,

    /// Output directory
    #[arg(short, long, default_value = "./refs")]
    pub output: String,

    /// Discard downloads smaller than this many bytes
    #[arg(long, default_value = "5000")]
    pub min_bytes: u64,

    /// Pause after each successful download, in milliseconds
    #[arg(short, long, default_value = "2500")]
    pub delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value = "30")]
    pub timeout_secs: u64,

    /// Maximum number of 301/302 hops to follow per request
    #[arg(long, default_value = "5")]
    pub max_redirects: u32,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Referer header sent with every request (some CDNs require one)
    #[arg(long)]
    pub referer: Option<String>,
}
