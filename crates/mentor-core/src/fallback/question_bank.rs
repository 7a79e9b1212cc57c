//! Static question bank.
//!
//! Backs both single adaptive questions and whole tests. Topics and
//! difficulties are normalised before lookup; anything unknown lands on
//! mathematics.

use crate::request::{GenerateQuestion, GenerateTest};
use crate::result::{GeneratedQuestion, GeneratedTest, TestQuestion};

/// One multiple-choice question in the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankQuestion {
    pub topic: &'static str,
    pub difficulty: &'static str,
    pub question: &'static str,
    pub options: [&'static str; 4],
    pub correct_answer: usize,
    pub explanation: &'static str,
    pub concepts: &'static [&'static str],
}

const DEFAULT_TOPIC: &str = "mathematics";

static BANK: &[BankQuestion] = &[
    // mathematics
    BankQuestion {
        topic: "mathematics",
        difficulty: "beginner",
        question: "What is 2 + 3?",
        options: ["4", "5", "6", "7"],
        correct_answer: 1,
        explanation: "Adding 2 and 3 gives 5.",
        concepts: &["Addition"],
    },
    BankQuestion {
        topic: "mathematics",
        difficulty: "beginner",
        question: "What is 12 divided by 4?",
        options: ["2", "3", "4", "6"],
        correct_answer: 1,
        explanation: "12 split into 4 equal groups leaves 3 in each group.",
        concepts: &["Division"],
    },
    BankQuestion {
        topic: "mathematics",
        difficulty: "intermediate",
        question: "What is the value of x in 2x + 5 = 11?",
        options: ["2", "3", "4", "5"],
        correct_answer: 1,
        explanation: "Subtract 5 from both sides to get 2x = 6, then divide by 2.",
        concepts: &["Linear equations", "Algebra"],
    },
    BankQuestion {
        topic: "mathematics",
        difficulty: "intermediate",
        question: "What is the area of a rectangle 6 units long and 4 units wide?",
        options: ["10", "20", "24", "28"],
        correct_answer: 2,
        explanation: "Area is length times width: 6 x 4 = 24.",
        concepts: &["Geometry", "Area"],
    },
    BankQuestion {
        topic: "mathematics",
        difficulty: "advanced",
        question: "What is the derivative of x²?",
        options: ["x", "2x", "x²", "2x²"],
        correct_answer: 1,
        explanation: "By the power rule, d/dx of x^n is n·x^(n-1), so x² becomes 2x.",
        concepts: &["Calculus", "Power rule"],
    },
    BankQuestion {
        topic: "mathematics",
        difficulty: "advanced",
        question: "What is the integral of 2x with respect to x?",
        options: ["x² + C", "2x² + C", "x + C", "2 + C"],
        correct_answer: 0,
        explanation: "The antiderivative of 2x is x², plus a constant of integration.",
        concepts: &["Calculus", "Integration"],
    },
    // javascript
    BankQuestion {
        topic: "javascript",
        difficulty: "beginner",
        question: "What is the correct way to declare a variable in modern JavaScript?",
        options: [
            "var name = 'John'",
            "let name = 'John'",
            "variable name = 'John'",
            "declare name = 'John'",
        ],
        correct_answer: 1,
        explanation: "'let' declares a block-scoped variable and avoids many var pitfalls.",
        concepts: &["Variables", "ES6"],
    },
    BankQuestion {
        topic: "javascript",
        difficulty: "beginner",
        question: "Which method adds an element to the end of an array?",
        options: ["push()", "add()", "append()", "insert()"],
        correct_answer: 0,
        explanation: "push() appends one or more elements and returns the new length.",
        concepts: &["Arrays", "Methods"],
    },
    BankQuestion {
        topic: "javascript",
        difficulty: "intermediate",
        question: "What does `typeof null` evaluate to?",
        options: ["'null'", "'undefined'", "'object'", "'number'"],
        correct_answer: 2,
        explanation: "A long-standing quirk of the language makes typeof null return 'object'.",
        concepts: &["Types"],
    },
    BankQuestion {
        topic: "javascript",
        difficulty: "intermediate",
        question: "Which array method returns a new array with transformed elements?",
        options: ["forEach()", "map()", "filter()", "reduce()"],
        correct_answer: 1,
        explanation: "map() calls a function on every element and collects the results.",
        concepts: &["Arrays", "Higher-order functions"],
    },
    BankQuestion {
        topic: "javascript",
        difficulty: "advanced",
        question: "What is a closure?",
        options: [
            "A function bundled with its surrounding scope",
            "A way to end a loop early",
            "A method that closes a browser tab",
            "A syntax error in a function body",
        ],
        correct_answer: 0,
        explanation: "A closure keeps access to variables from the scope it was created in.",
        concepts: &["Closures", "Scope"],
    },
    BankQuestion {
        topic: "javascript",
        difficulty: "advanced",
        question: "What does `await` do inside an async function?",
        options: [
            "Blocks the whole program",
            "Pauses the function until the promise settles",
            "Creates a new thread",
            "Cancels the promise",
        ],
        correct_answer: 1,
        explanation: "await suspends only the current async function until the promise resolves.",
        concepts: &["Promises", "Async"],
    },
    // python
    BankQuestion {
        topic: "python",
        difficulty: "beginner",
        question: "How do you create a list in Python?",
        options: [
            "list = {1, 2, 3}",
            "list = [1, 2, 3]",
            "list = (1, 2, 3)",
            "list = <1, 2, 3>",
        ],
        correct_answer: 1,
        explanation: "Square brackets create a list, which is ordered and mutable.",
        concepts: &["Lists", "Data Structures"],
    },
    BankQuestion {
        topic: "python",
        difficulty: "beginner",
        question: "What does the len() function do?",
        options: [
            "Lengthens a string",
            "Returns the length of an object",
            "Creates a new list",
            "Loops through items",
        ],
        correct_answer: 1,
        explanation: "len() returns the number of items in a string, list or dictionary.",
        concepts: &["Built-in Functions", "Data Types"],
    },
    BankQuestion {
        topic: "python",
        difficulty: "intermediate",
        question: "Which keyword defines a function in Python?",
        options: ["func", "function", "def", "lambda"],
        correct_answer: 2,
        explanation: "def introduces a named function definition.",
        concepts: &["Functions"],
    },
    BankQuestion {
        topic: "python",
        difficulty: "intermediate",
        question: "What does `{'a': 1}.get('b', 0)` return?",
        options: ["None", "KeyError", "0", "1"],
        correct_answer: 2,
        explanation: "get() returns the default when the key is missing.",
        concepts: &["Dictionaries"],
    },
    BankQuestion {
        topic: "python",
        difficulty: "advanced",
        question: "What does a generator function use to produce values lazily?",
        options: ["return", "yield", "async", "break"],
        correct_answer: 1,
        explanation: "yield hands back one value and suspends the function until the next request.",
        concepts: &["Generators", "Iteration"],
    },
    BankQuestion {
        topic: "python",
        difficulty: "advanced",
        question: "What is the result of `[x * 2 for x in range(3)]`?",
        options: ["[0, 2, 4]", "[2, 4, 6]", "[0, 1, 2]", "[1, 2, 3]"],
        correct_answer: 0,
        explanation: "range(3) yields 0, 1, 2 and each is doubled.",
        concepts: &["List comprehensions"],
    },
];

/// Map a free-form subject or topic onto a bank topic.
pub fn normalize_topic(raw: &str) -> Option<&'static str> {
    match raw.trim().to_lowercase().as_str() {
        "mathematics" | "math" | "maths" => Some("mathematics"),
        "javascript" | "js" => Some("javascript"),
        "python" | "py" => Some("python"),
        _ => None,
    }
}

/// Map a free-form difficulty onto beginner / intermediate / advanced.
pub fn normalize_difficulty(raw: &str) -> &'static str {
    match raw.trim().to_lowercase().as_str() {
        "beginner" | "easy" => "beginner",
        "advanced" | "hard" => "advanced",
        _ => "intermediate",
    }
}

fn questions_for(topic: &str) -> impl Iterator<Item = &'static BankQuestion> + '_ {
    BANK.iter().filter(move |q| q.topic == topic)
}

fn same_question(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

pub(super) fn generate_question(req: &GenerateQuestion) -> GeneratedQuestion {
    let topic = req
        .topic
        .as_deref()
        .and_then(normalize_topic)
        .or_else(|| normalize_topic(&req.subject))
        .unwrap_or(DEFAULT_TOPIC);
    let difficulty = normalize_difficulty(&req.difficulty);

    let pool: Vec<&BankQuestion> = questions_for(topic)
        .filter(|q| q.difficulty == difficulty)
        .collect();

    let unused = pool.iter().find(|q| {
        !req
            .previous_questions
            .iter()
            .any(|prev| same_question(prev, q.question))
    });

    let chosen = unused
        .copied()
        .or_else(|| {
            pool.get(req.previous_questions.len() % pool.len().max(1))
                .copied()
        })
        .unwrap_or(&BANK[0]);

    GeneratedQuestion {
        question: chosen.question.to_string(),
        kind: "multiple-choice".to_string(),
        subject: req.subject.clone(),
        difficulty: difficulty.to_string(),
        topic: req.topic.clone().unwrap_or_else(|| "general".to_string()),
        options: chosen.options.iter().map(|o| o.to_string()).collect(),
        correct_answer: chosen.correct_answer,
        explanation: chosen.explanation.to_string(),
        learning_objectives: chosen.concepts.iter().map(|c| c.to_string()).collect(),
        prerequisites: Vec::new(),
    }
}

fn display_topic(raw: &str, topic: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        let mut chars = topic.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    } else {
        trimmed.to_string()
    }
}

pub(super) fn generate_test(req: &GenerateTest) -> GeneratedTest {
    let topic = normalize_topic(&req.topic).unwrap_or(DEFAULT_TOPIC);

    let mut pool: Vec<&BankQuestion> = questions_for(topic).collect();
    if let Some(difficulty) = req.difficulty.as_deref() {
        let difficulty = normalize_difficulty(difficulty);
        let narrowed: Vec<&BankQuestion> = pool
            .iter()
            .copied()
            .filter(|q| q.difficulty == difficulty)
            .collect();
        if !narrowed.is_empty() {
            pool = narrowed;
        }
    }

    let questions = pool
        .iter()
        .cycle()
        .take(if pool.is_empty() { 0 } else { req.effective_count() })
        .enumerate()
        .map(|(i, q)| TestQuestion {
            id: i + 1,
            question: q.question.to_string(),
            options: q.options.iter().map(|o| o.to_string()).collect(),
            correct_answer: q.correct_answer,
            explanation: q.explanation.to_string(),
            difficulty: q.difficulty.to_string(),
            concepts: q.concepts.iter().map(|c| c.to_string()).collect(),
        })
        .collect();

    let name = display_topic(&req.topic, topic);
    GeneratedTest {
        title: format!("{} Test", name),
        description: format!("Test your knowledge of {} concepts", name),
        questions,
    }
}
