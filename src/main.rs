// src/main.rs
//
// s42 — point d'entrée (ligne de commande)
// ----------------------------------------
// But:
// - Journal : tracing_subscriber sur stderr, filtre RUST_LOG (défaut : info)
// - Options  : clap (voir app/etat.rs)
// - Rapport  : stdout (texte ou JSON)
//
// IMPORTANT (structure projet):
// - Tout le calcul vit dans la bibliothèque (somme_euler::noyau)
// - Ici: point d'entrée seulement

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

mod app;

use app::Cli;

/* ------------------------ Journal ------------------------ */

fn installer_journal() {
    let filtre = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filtre)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/* ------------------------ Entrée ------------------------ */

fn main() -> anyhow::Result<()> {
    installer_journal();
    let cli = Cli::parse();
    let sortie = app::executer(&cli)?;
    println!("{sortie}");
    Ok(())
}
