//! src/app/etat.rs
//!
//! État de la ligne de commande (sans vue, sans calcul).
//!
//! Rôle : décrire les options (clap) et les fondre dans une `ConfigCalcul`
//! (fichier JSON d'abord, puis options de la ligne de commande par-dessus).
//!
//! Contrats :
//! - Aucune évaluation ici.
//! - Défense en profondeur : bornes sur la précision (digits).

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use somme_euler::noyau::config::{ChoixSource, ConfigCalcul};
use somme_euler::noyau::precision::PRECISION_MIN;

/// Précision par défaut de la démonstration (série / forme close).
pub const DIGITS_DEMO: u32 = 50;

/// Précision de la certification dans la démonstration.
pub const DIGITS_DEMO_CERTIFICATION: u32 = 200;

/// Garde-fou : on borne la précision (anti-gel).
const DIGITS_MAX: u32 = 2000;

#[derive(Parser, Debug)]
#[command(
    name = "s42",
    version,
    about = "Somme d'Euler de poids 6 : S(x) = Σ H_{n−1} xⁿ / n⁵ (série, forme close, certification)"
)]
pub struct Cli {
    /// Fichier de configuration JSON
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Chiffres décimaux de travail (remplace la configuration)
    #[arg(long, short = 'p', global = true)]
    pub precision: Option<u32>,

    /// Sortie JSON au lieu du rapport texte
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub commande: Commande,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commande {
    /// S(x) par sommation directe
    Serie {
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
    },
    /// S(x) par la forme close (base calculée une fois pour tous les x)
    FormeClose {
        #[arg(long, allow_negative_numbers = true, value_delimiter = ',', required = true)]
        x: Vec<f64>,
    },
    /// Les 21 constantes de la base de poids 6
    Base,
    /// Coefficients rationnels c_i pour x
    Coefficients {
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
    },
    /// Série et forme close côte à côte
    Comparer {
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
    },
    /// Certification de la forme close (résidu < 10^-seuil)
    Verifier {
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
        /// Exposant du seuil de résidu
        #[arg(long)]
        seuil: Option<u32>,
        /// Redécouvrir la relation par PSLQ au lieu de la table
        #[arg(long)]
        pslq: bool,
    },
    /// Recherche PSLQ sur [S, ω_1..ω_21]
    Decouvrir {
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
        #[arg(long)]
        max_coeff: Option<u64>,
        #[arg(long)]
        max_iterations: Option<usize>,
    },
    /// Résidu en fonction de la précision
    Stabilite {
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
        #[arg(long, value_delimiter = ',')]
        precisions: Vec<u32>,
    },
    /// Scénario complet : comparaison à 50 chiffres, certification à 200
    Demo,
}

/// Garde-fou : limite digits.
pub fn borner_digits(digits: u32) -> u32 {
    digits.clamp(PRECISION_MIN, DIGITS_MAX)
}

impl Cli {
    /// Fichier (ou défauts), puis options par-dessus ; validée.
    pub fn configuration(&self) -> anyhow::Result<ConfigCalcul> {
        let mut config = match &self.config {
            Some(chemin) => ConfigCalcul::from_fichier(chemin)
                .with_context(|| format!("configuration {}", chemin.display()))?,
            None => ConfigCalcul::default(),
        };

        if let Some(p) = self.precision {
            config.precision = borner_digits(p);
        }

        match &self.commande {
            Commande::Verifier { seuil, pslq, .. } => {
                if let Some(e) = seuil {
                    config.exposant_seuil_residu = *e;
                }
                if *pslq {
                    config.source = ChoixSource::Recherche;
                }
            }
            Commande::Decouvrir {
                max_coeff,
                max_iterations,
                ..
            } => {
                config.source = ChoixSource::Recherche;
                if let Some(m) = max_coeff {
                    config.recherche.max_coeff = *m;
                }
                if let Some(n) = max_iterations {
                    config.recherche.max_iterations = *n;
                }
            }
            Commande::Stabilite { precisions, .. } if !precisions.is_empty() => {
                config.precisions_stabilite = precisions.iter().map(|&p| borner_digits(p)).collect();
            }
            _ => {}
        }

        config.validate().context("configuration invalide")?;
        Ok(config)
    }
}
