pub mod admin;
pub mod fun;
pub mod markov;

use crate::{Data, Error};

pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        markov::markov(),
        fun::eight_ball(),
        admin::shutdown(),
        admin::register(),
    ]
}
