mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use tracing_subscriber::EnvFilter;

use gnowgraph_core::backends::get_url_shortener;
use gnowgraph_core::config::Config;
use gnowgraph_core::import::ImportDocument;
use gnowgraph_core::ontology::{
    AttributeScopes, AttributetypeSpec, DataType, Metatype, Nodetype, RelationScopes,
    RelationtypeSpec, Status,
};
use gnowgraph_core::ping::{
    ping_directories, ping_on_save, DirectoryPinger, ExternalUrlsPinger, HttpTransport,
    PingTransport,
};
use gnowgraph_core::related::RelatedIndex;
use gnowgraph_core::{FileStorage, Graph, GraphManager, Locator, Nid, Storage};

use serve::ServeConfig;

#[derive(Parser)]
#[command(name = "gnow")]
#[command(about = "Typed ontology graph store", long_about = None)]
struct Cli {
    /// Graph snapshot to use instead of the configured one
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default gnow.toml and an empty graph
    Init {
        /// Overwrite an existing gnow.toml
        #[arg(long)]
        force: bool,
    },
    /// Add a metatype
    Metatype {
        title: String,
        #[arg(long)]
        slug: String,
        /// Slug of the parent metatype
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add an object type
    Nodetype {
        title: String,
        #[arg(long)]
        slug: String,
        /// Slug of the parent nodetype
        #[arg(long)]
        parent: Option<String>,
        /// Metatype slugs (repeatable)
        #[arg(long = "metatype")]
        metatypes: Vec<String>,
        /// Author names (repeatable)
        #[arg(long = "author")]
        authors: Vec<String>,
        #[arg(long, default_value = "")]
        content: String,
        /// Skip the pings configured to run on save
        #[arg(long)]
        no_ping: bool,
    },
    /// Add a relation type between two subject types
    Relationtype {
        title: String,
        #[arg(long)]
        slug: String,
        #[arg(long)]
        inverse: String,
        #[arg(long)]
        left: String,
        #[arg(long)]
        right: String,
    },
    /// Add an attribute type for a subject type
    Attributetype {
        title: String,
        #[arg(long)]
        slug: String,
        #[arg(long)]
        subject: String,
        /// Data type name or code ("char", "IntegerField", "2", ...)
        #[arg(long, default_value = "char")]
        data_type: String,
    },
    /// Relate two nodes
    Relate {
        left: String,
        relationtype: String,
        right: String,
    },
    /// Set an attribute value on a node
    Attribute {
        subject: String,
        attributetype: String,
        value: String,
    },
    /// Change the publication status of a nodetype or object
    Status {
        node: String,
        status: StatusArg,
        /// Skip the pings configured to run on save
        #[arg(long)]
        no_ping: bool,
    },
    /// Show a node or edge
    Show { node: String },
    /// Print the neighbourhood of a node as JSON
    Nbh {
        node: String,
        /// Titles and locators instead of Nids
        #[arg(long)]
        rendered: bool,
    },
    /// Print the graph JSON export of a node
    GraphJson { node: String },
    /// Print published nodetypes similar to a nodetype
    Related { node: String },
    /// Import a YAML or JSON document
    Import { file: PathBuf },
    /// Ping directories, or the external pages a nodetype links to
    Ping {
        node: String,
        #[arg(long)]
        external: bool,
    },
    /// Serve the graph over HTTP
    Serve {
        #[arg(short, long, default_value_t = 3333)]
        port: u16,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Draft,
    Hidden,
    Published,
}

impl From<StatusArg> for Status {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Draft => Status::Draft,
            StatusArg::Hidden => Status::Hidden,
            StatusArg::Published => Status::Published,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GNOW_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves a node reference: a numeric Nid or a unique slug.
fn resolve(graph: &Graph, reference: &str) -> Result<Nid> {
    if let Ok(id) = reference.trim_start_matches('#').parse::<u64>() {
        let nid = Nid(id);
        if !graph.contains(nid) {
            bail!("no node or edge with id {}", nid);
        }
        return Ok(nid);
    }
    match graph.find_by_slug(reference).as_slice() {
        [node] => Ok(node.nid),
        [] => bail!("no node with slug '{}'", reference),
        many => bail!("slug '{}' matches {} nodes, use an id", reference, many.len()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load().wrap_err("failed to load configuration")?;
    let storage = match &cli.graph {
        Some(path) => FileStorage::at(path),
        None => FileStorage::with_config(config.storage.clone()),
    };
    let locator = Locator::from_site(&config.site);

    let mut manager = GraphManager::open(storage, config.graph.clone())?;

    match cli.command {
        Commands::Init { force } => {
            let path = PathBuf::from("gnow.toml");
            if path.exists() && !force {
                println!("gnow.toml already exists. Use --force to overwrite.");
            } else {
                std::fs::write(&path, Config::default_config_string())
                    .wrap_err("failed to write gnow.toml")?;
                println!("Wrote {}", path.display());
            }
            if !manager.storage().exists() {
                manager.save()?;
            }
            println!("Graph: {}", manager.storage().path().display());
        }
        Commands::Metatype {
            title,
            slug,
            parent,
            description,
        } => {
            let mut metatype = Metatype::new(slug);
            if let Some(parent) = parent {
                metatype = metatype.with_parent(resolve(manager.graph(), &parent)?);
            }
            if let Some(description) = description {
                metatype = metatype.with_description(description);
            }
            let nid = manager.create_metatype(&title, metatype)?;
            println!("Created metatype {} ({})", title, nid);
        }
        Commands::Nodetype {
            title,
            slug,
            parent,
            metatypes,
            authors,
            content,
            no_ping,
        } => {
            let graph = manager.graph();
            let metatypes = metatypes
                .iter()
                .map(|m| resolve(graph, m))
                .collect::<Result<Vec<_>>>()?;
            let mut nodetype = Nodetype::objecttype(slug)
                .with_metatypes(metatypes)
                .with_authors(authors)
                .with_content(content);
            if let Some(parent) = parent {
                nodetype = nodetype.with_parent(resolve(graph, &parent)?);
            }
            let nid = manager.create_nodetype(&title, nodetype)?;
            println!("Created nodetype {} ({})", title, nid);
            if !no_ping {
                announce(manager.graph(), nid, &config, &locator).await?;
            }
        }
        Commands::Relationtype {
            title,
            slug,
            inverse,
            left,
            right,
        } => {
            let spec = RelationtypeSpec::new(
                inverse,
                resolve(manager.graph(), &left)?,
                resolve(manager.graph(), &right)?,
            );
            let nid = manager.create_nodetype(&title, Nodetype::relationtype(slug, spec))?;
            println!("Created relationtype {} ({})", title, nid);
        }
        Commands::Attributetype {
            title,
            slug,
            subject,
            data_type,
        } => {
            let data_type: DataType = data_type
                .parse()
                .wrap_err_with(|| format!("unknown data type '{}'", data_type))?;
            let spec = AttributetypeSpec::new(resolve(manager.graph(), &subject)?, data_type);
            let nid = manager.create_nodetype(&title, Nodetype::attributetype(slug, spec))?;
            println!("Created attributetype {} ({})", title, nid);
        }
        Commands::Relate {
            left,
            relationtype,
            right,
        } => {
            let graph = manager.graph();
            let (left, relationtype, right) = (
                resolve(graph, &left)?,
                resolve(graph, &relationtype)?,
                resolve(graph, &right)?,
            );
            let nid = manager.create_relation(left, relationtype, right, RelationScopes::default())?;
            println!("{}", manager.graph().relation_composed_sentence(nid)?);
        }
        Commands::Attribute {
            subject,
            attributetype,
            value,
        } => {
            let graph = manager.graph();
            let (subject, attributetype) = (resolve(graph, &subject)?, resolve(graph, &attributetype)?);
            let nid = manager.create_attribute(subject, attributetype, &value, AttributeScopes::default())?;
            println!("{}", manager.graph().attribute_composed_sentence(nid)?);
        }
        Commands::Status {
            node,
            status,
            no_ping,
        } => {
            let nid = resolve(manager.graph(), &node)?;
            let status = Status::from(status);
            manager.set_status(nid, status)?;
            println!("{} is now {}", nid, status);
            if status == Status::Published && !no_ping {
                announce(manager.graph(), nid, &config, &locator).await?;
            }
        }
        Commands::Show { node } => {
            let graph = manager.graph();
            let nid = resolve(graph, &node)?;
            show(graph, &locator, &config, nid)?;
        }
        Commands::Nbh { node, rendered } => {
            let graph = manager.graph();
            let nid = resolve(graph, &node)?;
            if rendered {
                print_json(&graph.rendered_nbh(nid, &locator)?)?;
            } else {
                print_json(&graph.nbh(nid)?)?;
            }
        }
        Commands::GraphJson { node } => {
            let graph = manager.graph();
            let nid = resolve(graph, &node)?;
            print_json(&graph.graph_json(nid, &locator)?)?;
        }
        Commands::Related { node } => {
            let graph = manager.graph();
            let nid = resolve(graph, &node)?;
            let mut index = RelatedIndex::from_config(&config.backends);
            let related = index.related(graph, nid, Utc::now());
            if related.is_empty() {
                println!("No related nodetypes.");
            }
            for other in related {
                println!("{}  {}", other, graph.title_of(other).unwrap_or_default());
            }
        }
        Commands::Import { file } => {
            let doc = ImportDocument::from_file(&file)?;
            let report = manager.import(&doc)?;
            println!("Imported {} records from {}", report.total(), file.display());
        }
        Commands::Ping { node, external } => {
            let graph = manager.graph();
            let nid = resolve(graph, &node)?;
            let transport: Arc<dyn PingTransport> = Arc::new(HttpTransport::from_config(&config.ping));
            if external {
                let pinger = ExternalUrlsPinger::new(locator.clone(), transport);
                let results = pinger.ping(graph, nid).await?;
                if results.is_empty() {
                    println!("No pingable external URLs.");
                }
                for (url, reply) in results {
                    println!("{} : {}", url, reply.message);
                }
            } else {
                let pingers: Vec<DirectoryPinger> = config
                    .ping
                    .directories
                    .iter()
                    .map(|server| {
                        DirectoryPinger::new(server, &config.site.name, locator.clone(), transport.clone())
                    })
                    .collect();
                for (server, replies) in ping_directories(&pingers, graph, &[nid]).await? {
                    for reply in replies {
                        println!("{} : {}", server, reply.message);
                    }
                }
            }
        }
        Commands::Serve { port } => {
            let graph = manager.into_graph();
            serve::start_server(
                graph,
                ServeConfig {
                    port,
                    locator,
                    url_shortener: config.backends.url_shortener.clone(),
                },
            )
            .await
            .map_err(|e| eyre!("server error: {}", e))?;
        }
    }

    Ok(())
}

/// Runs the pings enabled under `[ping]` for a freshly written node.
async fn announce(graph: &Graph, nid: Nid, config: &Config, locator: &Locator) -> Result<()> {
    let transport: Arc<dyn PingTransport> = Arc::new(HttpTransport::from_config(&config.ping));
    let pings = ping_on_save(
        graph,
        nid,
        Utc::now(),
        &config.ping,
        &config.site.name,
        locator,
        transport,
    )
    .await?;
    for (target, reply) in pings.iter() {
        println!("  ping {} : {}", target, reply.message);
    }
    Ok(())
}

fn show(graph: &Graph, locator: &Locator, config: &Config, nid: Nid) -> Result<()> {
    if let Some(edge) = graph.get_edge(nid) {
        let sentence = if edge.as_relation().is_some() {
            graph.relation_composed_sentence(nid)?
        } else {
            graph.attribute_composed_sentence(nid)?
        };
        println!("{}  {}", nid, sentence);
        println!("  Locator: {}", locator.locate_absolute(graph, nid)?);
        return Ok(());
    }

    let node = graph.node(nid)?;
    println!("{}  {}", nid, node.title);
    println!("  Type: {}", node.kind.type_name());
    if let Some(slug) = node.slug() {
        println!("  Slug: {}", slug);
    }
    if node.is_tree_node() {
        println!("  Path: {}", graph.tree_path(nid)?);
    }
    if let Some(publication) = node.publication() {
        println!("  Status: {}", publication.status);
        println!("  Visible: {}", graph.is_visible(nid, Utc::now())?);
    }
    println!("  Locator: {}", locator.locate_absolute(graph, nid)?);
    let shortener = get_url_shortener(&config.backends.url_shortener);
    println!("  Short URL: {}", shortener.shorten(graph, locator, nid)?);

    let relations = graph.relations_of(nid);
    for (name, edges) in relations.left.iter().chain(relations.right.iter()) {
        for edge in edges {
            println!("  {}: {}", name, graph.relation_composed_sentence(*edge)?);
        }
    }
    for (name, value) in graph.attributes_of(nid) {
        println!("  {} = {}", name, value);
    }
    Ok(())
}
