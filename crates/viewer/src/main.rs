use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use graphview::{
    EditorConfig, Form, GraphEditor, GraphInput, MenuAction, NodeType, NotificationKind,
    PointerButton, Position, Size,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod kdl;
mod persist;
mod svg;

use persist::FilePersister;

#[derive(Parser)]
#[command(name = "lifegraph", about = "Lay out, render and edit a life graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Viewport width used for the layout.
    #[arg(long, global = true, default_value_t = 800.0)]
    width: f64,

    /// Viewport height used for the layout.
    #[arg(long, global = true, default_value_t = 600.0)]
    height: f64,

    /// Seed for initial node placement.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Number of force simulation passes.
    #[arg(long, global = true)]
    iterations: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Print laid-out node positions as JSON.
    Layout { input: PathBuf },
    /// Render the current snapshot to SVG.
    Render {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Summarize the snapshot history.
    History { input: PathBuf },
    /// Add a node at a canvas point.
    AddNode {
        input: PathBuf,
        #[arg(long)]
        label: String,
        #[arg(long = "type", default_value = "person")]
        node_type: NodeType,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 100.0)]
        x: f64,
        #[arg(long, default_value_t = 100.0)]
        y: f64,
    },
    /// Connect two nodes.
    Connect {
        input: PathBuf,
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        #[arg(long)]
        label: String,
    },
    /// Delete a node and its connections.
    DeleteNode {
        input: PathBuf,
        #[arg(long)]
        id: String,
    },
}

fn load(path: &Path) -> anyhow::Result<GraphInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    if path.extension().is_some_and(|ext| ext == "kdl") {
        kdl::parse_kdl_graph(&content)
    } else {
        GraphInput::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }
}

/// Edits are saved next to KDL inputs as JSON; JSON inputs are updated in place.
fn save_path(input: &Path) -> PathBuf {
    if input.extension().is_some_and(|ext| ext == "json") {
        input.to_path_buf()
    } else {
        input.with_extension("json")
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = EditorConfig {
        viewport: Size::new(cli.width, cli.height),
        ..Default::default()
    };
    if let Some(iterations) = cli.iterations {
        config.layout.iterations = iterations;
    }
    let open = |path: &Path| -> anyhow::Result<GraphEditor> {
        let input = load(path)?;
        Ok(match cli.seed {
            Some(seed) => GraphEditor::with_seed(input, config.clone(), seed),
            None => GraphEditor::new(input, config.clone()),
        })
    };

    match &cli.command {
        Command::Layout { input } => {
            let editor = open(input)?;
            println!("{}", serde_json::to_string_pretty(editor.layout())?);
        }
        Command::Render { input, output } => {
            let editor = open(input)?;
            std::fs::write(output, svg::render_svg(&editor))
                .with_context(|| format!("writing {}", output.display()))?;
            info!(path = %output.display(), "wrote svg");
        }
        Command::History { input } => {
            let editor = open(input)?;
            let (snapshots, current) = editor.history();
            for (i, snapshot) in snapshots.iter().enumerate() {
                let marker = if i == current { "*" } else { " " };
                println!(
                    "{marker} {i:>3}  {} nodes  {} edges",
                    snapshot.nodes.len(),
                    snapshot.edges.len()
                );
            }
        }
        Command::AddNode {
            input,
            label,
            node_type,
            description,
            x,
            y,
        } => {
            let mut editor = open(input)?;
            let now = Instant::now();
            let screen = editor.viewport().to_screen(Position::new(*x, *y));
            editor.context_click(screen);
            editor.select_action(MenuAction::AddNode, now);
            match editor.form_mut() {
                Some(Form::Node(form)) => {
                    form.label = label.clone();
                    form.node_type = *node_type;
                    form.description = description.clone();
                }
                _ => bail!("({x}, {y}) is on top of an existing node"),
            }
            editor.submit_form(now)?;
            persist_edits(&mut editor, input)?;
        }
        Command::Connect {
            input,
            source,
            target,
            label,
        } => {
            let mut editor = open(input)?;
            let now = Instant::now();
            let at = |id: &str| {
                editor
                    .position_of(id)
                    .map(|p| editor.viewport().to_screen(p))
                    .with_context(|| format!("no node with id {id}"))
            };
            let (from, to) = (at(source)?, at(target)?);
            editor.context_click(from);
            editor.select_action(MenuAction::CreateConnection, now);
            editor.pointer_down(to, PointerButton::Primary, now);
            editor.pointer_up(to);
            match editor.form_mut() {
                Some(Form::Edge(form)) => form.label = label.clone(),
                _ => bail!("could not connect {source} to {target}"),
            }
            editor.submit_form(now)?;
            persist_edits(&mut editor, input)?;
        }
        Command::DeleteNode { input, id } => {
            let mut editor = open(input)?;
            editor.delete_node(id, Instant::now())?;
            persist_edits(&mut editor, input)?;
        }
    }

    Ok(())
}

fn persist_edits(editor: &mut GraphEditor, input: &Path) -> anyhow::Result<()> {
    let persister = FilePersister::new(save_path(input));
    let outcomes = smol::block_on(editor.flush(&persister, Instant::now()));

    for note in editor.notifications().active() {
        match note.kind {
            NotificationKind::Error => error!("{}", note.message),
            _ => info!("{}", note.message),
        }
    }
    if outcomes.iter().any(|(_, accepted)| !accepted) {
        bail!("graph changes were not saved");
    }
    Ok(())
}
