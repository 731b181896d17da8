#![forbid(unsafe_code)]

//! `ledwall`: load a wall layout, resolve its geometry, and report it.
//!
//! Run with `--help` for options.

mod cli;

use std::fs;
use std::path::Path;
use std::process;
use std::sync::Arc;

use ledwall::{
    CommandSink, ConfigDocument, EditorModel, ElementKind, Error, FileCommandSink, MemorySync,
    Program, RemoteSync, RenderCommand, ResolvedCanvas, TopologyDocument, TopologyError,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Opts;

/// Variable holding the log filter directive.
const LOG_ENV: &str = "LEDWALL_LOG";

fn main() {
    let opts = Opts::parse();
    init_logging(opts.log_json);

    if let Err(err) = run(&opts) {
        error!(error = %err, "ledwall failed");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = installed {
        eprintln!("warning: logging disabled: {e}");
    }
}

fn run(opts: &Opts) -> ledwall::Result<()> {
    let sync = remote(opts)?;
    info!(backend = sync.name(), "loading wall layout");

    let mut program = Program::new(EditorModel::new(opts.config.clone(), sync));
    program.init();
    // Topology and configuration load concurrently; allow each its timeout.
    program.pump_until_idle(opts.config.sync.timeout * 2);

    let editor = program.model();
    let Some(canvas) = editor.canvas().copied() else {
        return Err(Error::Unresolved(editor.notices().to_vec()));
    };
    for notice in editor.notices() {
        warn!(%notice, "load incomplete");
    }

    report(editor, &canvas);
    if opts.place
        && let Some(path) = &opts.config.command_file
    {
        place_all(editor, &canvas, path)?;
    }
    if let Some(path) = &opts.save {
        save(editor, path)?;
    }
    Ok(())
}

/// Local files when `--topology` is given, the HTTP back end otherwise.
fn remote(opts: &Opts) -> ledwall::Result<Arc<dyn RemoteSync>> {
    let Some(topology_path) = &opts.topology else {
        return remote_http(opts);
    };
    let topology = TopologyDocument::from_json(&fs::read_to_string(topology_path)?)
        .map_err(TopologyError::Malformed)?;
    let config = match &opts.config_file {
        Some(path) => ConfigDocument::from_json(&fs::read_to_string(path)?)?,
        None => ConfigDocument::default(),
    };
    Ok(Arc::new(
        MemorySync::new().with_topology(topology).with_config(config),
    ))
}

#[cfg(feature = "http")]
fn remote_http(opts: &Opts) -> ledwall::Result<Arc<dyn RemoteSync>> {
    Ok(Arc::new(ledwall::HttpSync::new(opts.config.sync.clone())?))
}

#[cfg(not(feature = "http"))]
fn remote_http(_opts: &Opts) -> ledwall::Result<Arc<dyn RemoteSync>> {
    Err(Error::Transport(ledwall::TransportError::Unavailable(
        "built without the `http` feature; pass --topology=FILE".into(),
    )))
}

fn report(editor: &EditorModel, canvas: &ResolvedCanvas) {
    let extent = canvas.extent;
    let (screen_w, screen_h) = canvas.screen_size();
    let panels = editor.topology().map_or(0, |t| t.instances().len());

    println!(
        "extent   x {}..{}  y {}..{}  ({}x{})",
        extent.min_x,
        extent.max_x,
        extent.min_y,
        extent.max_y,
        extent.width(),
        extent.height()
    );
    println!("scale    {:.4}", canvas.scale.get());
    println!("screen   {screen_w:.0}x{screen_h:.0}");
    println!("panels   {panels}");
    println!("layers   {}", editor.stack().len());
    for element in editor.stack().iter() {
        let wall = canvas.to_wall(element.location);
        let detail = match &element.kind {
            ElementKind::Image { filepath, .. } => filepath.as_str(),
            ElementKind::Text { content, .. } => content.as_str(),
        };
        println!(
            "  {:>3}  {:<12} {:<5}  ({}, {})  {detail}",
            element.id().get(),
            element.name,
            element.kind.type_name(),
            wall.x,
            wall.y
        );
    }
}

fn place_all(editor: &EditorModel, canvas: &ResolvedCanvas, path: &Path) -> ledwall::Result<()> {
    let sink = FileCommandSink::new(path);
    let mut sent = 0;
    for element in editor.stack().iter() {
        let commands = RenderCommand::place(
            element.id().get(),
            element,
            canvas.to_wall(element.location),
        );
        sink.send_all(&commands)?;
        sent += commands.len();
    }
    info!(path = %path.display(), commands = sent, "placement commands written");
    Ok(())
}

fn save(editor: &EditorModel, path: &Path) -> ledwall::Result<()> {
    let Some(doc) = editor.to_document() else {
        return Err(Error::Unresolved(editor.notices().to_vec()));
    };
    fs::write(path, doc.to_json()?)?;
    info!(path = %path.display(), elements = doc.elements.len(), "configuration saved");
    Ok(())
}
