use anyhow::{Context, Result};
use clap::Args;
use console::style;

use kgx::loader::{truncate_chars, WebLoader};
use kgx::pipeline::TriplePipeline;
use kgx::providers::openai::OpenAiProvider;
use kgx::settings::{Overrides, Settings};
use kgx::store::TripleStore;

use crate::render::{preview, print_markdown, triples_table};

#[derive(Args)]
pub struct ExtractArgs {
    /// Page to read (prompted for when omitted)
    pub url: Option<String>,

    /// API key (can also be set via KGX_PROVIDER__API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API, including the version segment
    #[arg(long)]
    pub base_url: Option<String>,

    /// Model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum number of page characters sent to the model
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Do not store the extracted triples
    #[arg(long)]
    pub no_save: bool,

    /// Print the triples as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(mut settings: Settings, args: ExtractArgs) -> Result<()> {
    cliclack::intro(style(" kgx extract ").on_cyan().black())?;

    let url = match args.url {
        Some(url) => url,
        None => cliclack::input("Which page should we read?")
            .placeholder("https://")
            .interact()?,
    };

    let api_key = match args.api_key {
        Some(key) => Some(key),
        None if settings.provider.api_key.is_none() => Some(
            cliclack::password("Enter your API key")
                .mask('▪')
                .interact()?,
        ),
        None => None,
    };

    settings.apply(Overrides {
        api_key,
        host: args.base_url,
        model: args.model,
        max_chars: args.max_chars,
    });

    // Build the gateway first so a missing key fails before any network traffic
    let provider = OpenAiProvider::new(settings.provider.to_config())?;
    let loader = WebLoader::new(settings.loader.strategy, settings.loader.timeout())?;

    let spin = cliclack::spinner();
    spin.start("Fetching page...");
    let page = match loader.fetch_main_text(&url).await {
        Ok(page) => page,
        Err(e) => {
            spin.error("Could not fetch the page");
            return Err(e.into());
        }
    };
    spin.stop(format!("Fetched {}", url));

    if page.is_empty() {
        cliclack::log::warning("No readable text was found on the page")?;
        cliclack::outro("Nothing to extract")?;
        return Ok(());
    }

    let text = truncate_chars(&page, settings.max_chars());
    cliclack::note("Text preview", preview(text))?;

    let spin = cliclack::spinner();
    spin.start(format!(
        "Extracting, verifying and confirming triples with {}...",
        provider.model()
    ));
    let pipeline = TriplePipeline::new(Box::new(provider)).with_options(settings.pipeline_options());
    let run = match pipeline.run_stages(text).await {
        Ok(run) => run,
        Err(e) => {
            spin.error("The model call failed");
            return Err(e.into());
        }
    };
    spin.stop(format!(
        "{} extracted, {} verified, {} confirmed",
        run.extracted.len(),
        run.verified.len(),
        run.confirmed.len()
    ));

    if run.confirmed.is_empty() {
        cliclack::log::warning("No valid triples were extracted")?;
        cliclack::outro("Done")?;
        return Ok(());
    }

    if !args.no_save {
        let store = TripleStore::open(&settings.store.path)
            .with_context(|| format!("Failed to open {}", settings.store.path.display()))?;
        let inserted = store.insert_triples(&run.confirmed, &url)?;
        cliclack::log::success(format!(
            "Saved {} triples to {}",
            inserted,
            store.path().display()
        ))?;
    }

    cliclack::outro("Done")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run.confirmed)?);
        Ok(())
    } else {
        print_markdown(&triples_table(&run.confirmed))
    }
}
