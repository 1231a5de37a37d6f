//! Built-in one-liners for the joke handler.

use rand::seq::SliceRandom;

const JOKES: &[&str] = &[
    "There are only 10 kinds of people in this world: those who know binary and those who don't.",
    "A programmer's partner asks them to buy a loaf of bread and, if they have eggs, a dozen. They come home with twelve loaves.",
    "Why do programmers prefer dark mode? Because light attracts bugs.",
    "I would tell you a UDP joke, but you might not get it.",
    "Debugging is like being the detective in a crime movie where you are also the murderer.",
    "There are two hard problems in computer science: cache invalidation, naming things, and off-by-one errors.",
    "Why did the developer go broke? Because they used up all their cache.",
    "A SQL query walks into a bar, walks up to two tables and asks: may I join you?",
    "Knock knock. Race condition. Who's there?",
    "To understand recursion, you must first understand recursion.",
    "Why was the function sad after the party? It didn't get called.",
    "The best thing about a boolean is that even if you are wrong, you are only off by a bit.",
];

/// Pick a joke at random.
pub fn random_joke() -> &'static str {
    JOKES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(JOKES[0])
}
