//! Noyau numérique : S(x) = Σ H_{n−1} xⁿ / n⁵ en haute précision
//!
//! Organisation interne :
//! - precision.rs    : contexte de précision (valeur explicite + porte RAII)
//! - reel.rs         : réel en virgule fixe (BigInt · 2^-bits)
//! - constantes.rs   : π (cache), log, ζ, nombres tangents
//! - polylog.rs      : Li_s, Cl_s
//! - harmonique.rs   : nombres harmoniques
//! - serie.rs        : somme directe + critère de convergence
//! - base.rs         : base de poids 6 (21 constantes)
//! - coefficients.rs : tables rationnelles figées
//! - forme_close.rs  : Σ c_i ω_i, comparaison, chronométrage
//! - pslq.rs         : recherche de relation entière
//! - verification.rs : certification + stabilité en précision
//! - config.rs       : configuration JSON
//! - format.rs       : affichage (rationnels, résidus, durées)

pub mod base;
pub mod coefficients;
pub mod config;
pub mod constantes;
pub mod erreur;
pub mod format;
pub mod forme_close;
pub mod harmonique;
pub mod polylog;
pub mod precision;
pub mod pslq;
pub mod reel;
pub mod serie;
pub mod verification;

#[cfg(test)]
mod tests_scientifiques;

#[cfg(test)]
mod tests_fuzz_safe;

// API publique
pub use base::{compute_basis, Base};
pub use coefficients::{get_coefficients, Coefficients, PointSupporte, AVAILABLE_X_VALUES};
pub use config::ConfigCalcul;
pub use erreur::{Erreur, Resultat};
pub use forme_close::{batch_evaluate_closed_form, compare_with_series, evaluate_closed_form};
pub use precision::{avec_precision, precision_ambiante, PortePrecision, Precision};
pub use pslq::{pslq, BornesRecherche};
pub use reel::Reel;
pub use serie::{evaluate_series, ResultatSerie};
pub use verification::{analyze_stability, discover_relation, verify_identity, RapportVerification};
