use crate::{Context, Error};
use rand::seq::IndexedRandom;

const EIGHT_BALL_ANSWERS: &[&str] = &[
    // Positive
    "Certamente",
    "Com certeza sim",
    "Sem dúvidas!",
    "Definitivamente sim",
    "Pode ter certeza que sim",
    "Da forma que eu vejo a situação, sim",
    "Provavelmente sim",
    "Sim",
    "Sinais me dizem que sim",
    // Neutral
    "O futuro é nebuloso",
    "Me pergunte novamente mais tarde...",
    "Melhor não te falar agora",
    "Não consigo prever isso agora",
    "Se concentre e pergunte novamente",
    // Negative
    "Não conte com isso",
    "Minha resposta é não",
    "Minhas fontes dizem que não",
    "Claro que não!",
    "Eu tenho minhas dúvidas",
];

fn pick_answer() -> &'static str {
    EIGHT_BALL_ANSWERS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("O futuro é nebuloso")
}

/// O que a bola mágica tem pra te dizer?
#[poise::command(slash_command, prefix_command, rename = "8ball")]
pub async fn eight_ball(
    ctx: Context<'_>,
    #[description = "Sua pergunta"]
    #[rest]
    question: Option<String>,
) -> Result<(), Error> {
    let answer = pick_answer();
    let reply = match question.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(question) => format!("> {}\n{}", question, answer),
        None => format!("> {}", answer),
    };
    ctx.say(reply).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_come_from_the_list() {
        for _ in 0..100 {
            assert!(EIGHT_BALL_ANSWERS.contains(&pick_answer()));
        }
    }
}
