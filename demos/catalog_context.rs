use std::sync::Arc;

use catalog_context::io::scheme_of;
use catalog_context::{
    select_loader, CatalogContext, FileIoLoader, LoaderRef, LoaderRegistry, Options,
};

#[derive(Debug)]
struct LocalLoader;

impl FileIoLoader for LocalLoader {
    fn identifier(&self) -> &str {
        "local"
    }

    fn scheme(&self) -> &str {
        "file"
    }
}

fn main() -> Result<(), catalog_context::Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let registry: LoaderRegistry = [Arc::new(LocalLoader) as LoaderRef].into_iter().collect();

    let options: Options = [
        ("warehouse", "file:///tmp/warehouse"),
        ("hadoop-load-default-config", "true"),
        ("hadoop.fs.defaultFS", "file:///"),
    ]
    .into_iter()
    .collect();
    let ctx = CatalogContext::create_with_fallback(options, registry.get("local"))?;

    println!("kind: {:?}", ctx.kind());
    if let Some(conf) = ctx.hadoop_conf() {
        for (name, value) in conf.iter() {
            println!("hadoop: {name} = {value}");
        }
    }

    let warehouse = ctx.options().get("warehouse").unwrap_or_default();
    let scheme = scheme_of(&warehouse).unwrap_or("file");
    let chosen = select_loader(&ctx, scheme, &registry);
    println!("loader for {warehouse}: {:?}", chosen.map(|l| l.identifier().to_string()));

    println!("transport form:\n{}", ctx.to_toml()?);
    Ok(())
}
