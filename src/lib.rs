//! somme_euler : la somme d'Euler de poids 6 S(x) = Σ H_{n−1} xⁿ / n⁵
//! pour x ∈ {1/2, 1/4, −1/2}, par série directe et par forme close,
//! avec certification de la forme close (relation entière, PSLQ).

pub mod noyau;

pub use noyau::*;
