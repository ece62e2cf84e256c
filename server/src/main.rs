use anyhow::Context;
use async_graphql_tide::graphql;
use clap::Parser;
use docql::{backend::memory::MemoryStore, Document};
use std::fs::File;
use std::path::PathBuf;

mod schema;
mod test_runner;

/// Serve a GraphQL API over an in-memory document store.
#[derive(Clone, Debug, Parser)]
struct Options {
    /// The port where the app should be served.
    #[clap(short, long, env = "DOCQL_PORT", default_value = "8080")]
    port: u16,

    /// A JSON file with documents to load into the store at startup.
    ///
    /// The file must contain an object mapping collection names to arrays of documents.
    #[clap(short, long, env = "DOCQL_SEED")]
    seed: Option<PathBuf>,

    /// Print the schema in SDL format and exit.
    #[clap(long)]
    print_schema: bool,
}

impl Options {
    async fn store(&self) -> anyhow::Result<MemoryStore> {
        let store = MemoryStore::new();
        if let Some(path) = &self.seed {
            let file =
                File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
            let data: Document = serde_json::from_reader(file)
                .with_context(|| format!("cannot parse {}", path.display()))?;
            store.seed(data).await?;
        }
        Ok(store)
    }

    async fn serve(self) -> anyhow::Result<()> {
        let schema = schema::generate(self.store().await?)?;
        let mut app = tide::new();
        app.at("/graphql").all(graphql(schema));
        tracing::info!("serving GraphQL API on port {}", self.port);
        app.listen(format!("0.0.0.0:{}", self.port)).await?;
        Ok(())
    }
}

#[async_std::main]
async fn main() -> anyhow::Result<()> {
    docql::init_logging();
    let opt = Options::parse();
    if opt.print_schema {
        println!("{}", schema::generate(MemoryStore::new())?.sdl());
        return Ok(());
    }
    opt.serve().await
}
