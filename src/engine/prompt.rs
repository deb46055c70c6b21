use crate::model::mode::{EndingKind, EventKind};

/// Builds every piece of text sent to the model.
/// Pure formatting: no parsing, no networking, no session changes.
pub struct PromptBuilder;

/// How the action turn's directive should shape the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionShape {
    /// Narrate and offer three lettered choices.
    Choices,
    /// Narrate, then open the event with its marker and no choices.
    Event(EventKind),
    /// Narrate without choices; the quiz question is fetched separately.
    QuizFollows,
}

impl PromptBuilder {
    /// The persona and tag protocol for one game.
    pub fn system_instruction(field: &str, role: &str) -> String {
        let mut prompt = String::new();
        push_persona(&mut prompt, field, role);
        push_stat_table(&mut prompt);
        push_world_rules(&mut prompt);
        push_tag_protocol(&mut prompt);
        push_style(&mut prompt);
        prompt
    }

    pub fn intro(field: &str, role: &str) -> String {
        format!(
            "I am a graduate student on the {role} track, working on {field}. \
Open the first chapter: my thesis proposal defense.\n\n{}",
            choices_instruction()
        )
    }

    pub fn action(action: &str, shape: ActionShape) -> String {
        let mut prompt = String::new();
        push_player_action(&mut prompt, action);

        match shape {
            ActionShape::Choices => prompt.push_str(&choices_instruction()),
            ActionShape::Event(EventKind::Quiz) => prompt.push_str(
                "[SYSTEM]: Narrate the outcome, then spring a pop quiz on the player. \
Give NO lettered choices. Write the marker [EVENT: QUIZ] on its own line, \
followed by one short question testing a core concept of the player's field \
(or a buggy snippet of analysis code to correct).",
            ),
            ActionShape::Event(EventKind::BossBattle) => prompt.push_str(
                "[SYSTEM]: Narrate the outcome, then start a boss battle: a hostile reviewer, \
committee member or PI attacks the player's work. Give NO lettered choices. \
Write the marker [EVENT: BOSS_BATTLE] on its own line, followed by the attack \
the player must rebut.",
            ),
            ActionShape::QuizFollows => prompt.push_str(
                "[SYSTEM]: Narrate the outcome only. Give NO lettered choices and do not \
ask any question: a pop quiz is handed to the player right after your reply.",
            ),
        }

        prompt
    }

    pub fn quiz_answer(question: &str, answer: &str) -> String {
        format!(
            "[ANSWER_QUIZ]: {answer}\n\n\
[SYSTEM]: The quiz question was: {question}\n\
Grade the answer honestly, apply the consequences to the stat table, \
then resume the story. {}",
            choices_instruction()
        )
    }

    pub fn rebuttal(attack: &str, rebuttal: &str) -> String {
        format!(
            "[GRADE: REBUTTAL]: {rebuttal}\n\n\
[SYSTEM]: The attack was: {attack}\n\
Decide whether the rebuttal is ACCEPTED or REJECTED, say which, apply the \
consequences to the stat table, then resume the story. {}",
            choices_instruction()
        )
    }

    /// Stand-alone request for a quiz question, sent without any history.
    pub fn quiz_question(field: &str, role: &str) -> String {
        format!(
            "Write one short exam-style question for a graduate student on the {role} \
track working on {field}. Test a core concept, or give a three-line buggy \
analysis snippet to correct. Reply with the question only."
        )
    }
}

fn choices_instruction() -> String {
    "[SYSTEM]: End with exactly three options labelled A), B) and C).".to_string()
}

fn push_player_action(prompt: &mut String, action: &str) {
    prompt.push_str("PLAYER ACTION:\n");
    prompt.push_str(action.trim());
    prompt.push_str("\n\n");
}

fn push_persona(prompt: &mut String, field: &str, role: &str) {
    prompt.push_str(
        "You are the engine of \"Academic Survival\", a hardcore text RPG that simulates \
the real life of a research student through dark humour.\n\n",
    );
    prompt.push_str(&format!(
        "The player is on the {role} track, researching {field}.\n\n"
    ));
}

fn push_stat_table(prompt: &mut String) {
    prompt.push_str(
        "Stat tracking:\n\
Begin every reply with an updated Markdown table:\n\
| Stat | Value | Notes |\n\
| :--- | :--- | :--- |\n\
| **Hair / Sanity** | 100 | At zero the player gives up research. |\n\
| **Output (indices)** | 0 | Papers; the hard requirement for graduating. |\n\
| **Funding** | 50 | At zero the project stalls. |\n\
| **Advisor favour** | 50 | Drives resources and reference letters. |\n\n",
    );
}

fn push_world_rules(prompt: &mut String) {
    prompt.push_str(
        "World rules:\n\
- Experimental work: alignment drift, vacuum leaks, contaminated samples, helium shortages.\n\
- Theory and computation: divergent algorithms, cluster queues, a sign error on line one.\n\
- Shared misery: Reviewer 2, getting scooped on arXiv the day before submission, \
reimbursement paperwork, awkward poster sessions.\n\
- Never name real universities or places.\n\n",
    );
}

fn push_tag_protocol(prompt: &mut String) {
    prompt.push_str(
        "Control markers (write them exactly, in capitals):\n\
- [EVENT: QUIZ] followed by the question, only when asked to start a quiz.\n\
- [EVENT: BOSS_BATTLE] followed by the attack, only when asked to start a boss battle.\n",
    );
    let endings: Vec<&str> = EndingKind::TAGGED.iter().map(|e| e.tag()).collect();
    prompt.push_str(&format!(
        "- [GAME_OVER: <KIND>] followed by a final report, when the story ends. \
KIND is one of {}.\n\n",
        endings.join(", ")
    ));
}

fn push_style(prompt: &mut String) {
    prompt.push_str(
        "Style:\n\
- Dry, sarcastic humour.\n\
- Outcomes of choices are uncertain; consequences swing both ways.\n",
    );
}
