// src/noyau/erreur.rs
//
// Erreurs du noyau.
//
// Deux familles :
// - préconditions violées (x hors table, |x| ≥ 1, précision hors bornes, domaine) :
//   renvoyées immédiatement par les opérations ;
// - issues dégradées (non-convergence, relation introuvable, résidu trop grand) :
//   d'abord portées par les rapports, puis converties en erreur seulement quand
//   l'appelant exige un succès (`exiger_convergence`, `exiger_acceptation`).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Erreur {
    #[error("aucune identité connue pour x = {x} (valeurs disponibles : {disponibles})")]
    ValeurXNonSupportee { x: f64, disponibles: String },

    #[error("série divergente : |x| = {x} n'est pas < 1")]
    EntreeDivergente { x: String },

    #[error("pas de convergence après {termes} termes")]
    NonConvergence { termes: u64 },

    #[error("aucune relation entière trouvée ({0})")]
    RelationIntrouvable(String),

    #[error("relation dégénérée : le coefficient de la cible est nul")]
    RelationDegeneree,

    #[error("résidu {residu} au-dessus du seuil {seuil}")]
    ResiduExcessif { residu: String, seuil: String },

    #[error("précision invalide : {chiffres} chiffres (bornes {min}..={max})")]
    PrecisionInvalide { chiffres: u32, min: u32, max: u32 },

    #[error("hors domaine : {0}")]
    Domaine(String),

    #[error("dimensions incompatibles : {0}")]
    Dimension(String),

    #[error("configuration invalide : {0}")]
    Config(String),

    #[error("lecture impossible : {0}")]
    Lecture(String),
}

pub type Resultat<T> = Result<T, Erreur>;
