//! Keyword-category replies for chat and conversational turns.
//!
//! Categories are scanned in a fixed order and the first match wins. Inside a
//! category, sub-topics are tried before the category's general reply.

use lazy_static::lazy_static;
use regex::Regex;

use super::stable_index;
use crate::request::{Chat, ConversationalTurn};
use crate::result::{ChatReply, ConversationReply};

lazy_static! {
    static ref JAVASCRIPT: Regex = Regex::new(r"(?i)\b(javascript|js)\b").unwrap();
    static ref JS_VARIABLES: Regex = Regex::new(r"(?i)\b(variables?|let|const|var)\b").unwrap();
    static ref JS_FUNCTIONS: Regex = Regex::new(r"(?i)\bfunctions?\b").unwrap();

    static ref PYTHON: Regex = Regex::new(r"(?i)\b(python|py)\b").unwrap();
    static ref PY_LISTS: Regex = Regex::new(r"(?i)\b(lists?|arrays?)\b").unwrap();
    static ref PY_DICTS: Regex = Regex::new(r"(?i)\b(dicts?|dictionary|dictionaries)\b").unwrap();

    static ref REACT: Regex = Regex::new(r"(?i)\breact\b").unwrap();
    static ref REACT_COMPONENTS: Regex = Regex::new(r"(?i)\bcomponents?\b").unwrap();
    static ref REACT_HOOKS: Regex = Regex::new(r"(?i)\b(hooks?|usestate|useeffect)\b").unwrap();

    static ref LOOPS: Regex = Regex::new(r"(?i)\b(loops?|looping|iterate|iteration)\b").unwrap();
    static ref MATH: Regex =
        Regex::new(r"(?i)\b(math|maths|mathematics|calculate|algebra|geometry|calculus)\b").unwrap();
    static ref WEATHER: Regex = Regex::new(r"(?i)\b(weather|forecast)\b").unwrap();
    static ref COOKING: Regex = Regex::new(r"(?i)\b(recipes?|cook|cooking|bake|baking)\b").unwrap();
    static ref HELP: Regex = Regex::new(r"(?i)\b(help|advice)\b").unwrap();
}

/// Broad subject a chat message is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCategory {
    JavaScript,
    Python,
    React,
    Loops,
    Math,
    Weather,
    Cooking,
    Help,
}

impl ChatCategory {
    /// Scan order. First match wins.
    pub const ORDER: [ChatCategory; 8] = [
        ChatCategory::JavaScript,
        ChatCategory::Python,
        ChatCategory::React,
        ChatCategory::Loops,
        ChatCategory::Weather,
        ChatCategory::Cooking,
        ChatCategory::Math,
        ChatCategory::Help,
    ];

    fn pattern(&self) -> &'static Regex {
        match self {
            ChatCategory::JavaScript => &JAVASCRIPT,
            ChatCategory::Python => &PYTHON,
            ChatCategory::React => &REACT,
            ChatCategory::Loops => &LOOPS,
            ChatCategory::Math => &MATH,
            ChatCategory::Weather => &WEATHER,
            ChatCategory::Cooking => &COOKING,
            ChatCategory::Help => &HELP,
        }
    }

    /// Sub-topic reply for `message`. Sub-topics are tried in order.
    fn subtopic_reply(&self, message: &str) -> Option<&'static str> {
        let subtopics: Vec<(&Regex, &'static str)> = match self {
            ChatCategory::JavaScript => vec![
                (&*JS_VARIABLES, JS_VARIABLES_REPLY),
                (&*JS_FUNCTIONS, JS_FUNCTIONS_REPLY),
            ],
            ChatCategory::Python => vec![
                (&*PY_LISTS, PY_LISTS_REPLY),
                (&*PY_DICTS, PY_DICTS_REPLY),
            ],
            ChatCategory::React => vec![
                (&*REACT_COMPONENTS, REACT_COMPONENTS_REPLY),
                (&*REACT_HOOKS, REACT_HOOKS_REPLY),
            ],
            _ => Vec::new(),
        };

        subtopics
            .into_iter()
            .find(|(pattern, _)| pattern.is_match(message))
            .map(|(_, reply)| reply)
    }

    fn general_reply(&self) -> &'static str {
        match self {
            ChatCategory::JavaScript => JS_REPLY,
            ChatCategory::Python => PYTHON_REPLY,
            ChatCategory::React => REACT_REPLY,
            ChatCategory::Loops => LOOPS_REPLY,
            ChatCategory::Math => MATH_REPLY,
            ChatCategory::Weather => WEATHER_REPLY,
            ChatCategory::Cooking => COOKING_REPLY,
            ChatCategory::Help => HELP_REPLY,
        }
    }

    fn suggested_questions(&self) -> &'static [&'static str] {
        match self {
            ChatCategory::JavaScript => &[
                "What is the difference between let and const?",
                "How do arrow functions work?",
            ],
            ChatCategory::Python => &[
                "How do I loop over a dictionary?",
                "When should I use a tuple instead of a list?",
            ],
            ChatCategory::React => &[
                "How do props differ from state?",
                "When does a component re-render?",
            ],
            ChatCategory::Loops => &[
                "When should I use a while loop instead of a for loop?",
                "How do I stop a loop early?",
            ],
            ChatCategory::Math => &[
                "Can you walk me through solving a linear equation?",
                "How do I find the area of a triangle?",
            ],
            ChatCategory::Weather => &["How do I call a weather API from JavaScript?"],
            ChatCategory::Cooking => &["How could I build a recipe app?"],
            ChatCategory::Help => &[
                "What should I study first?",
                "How can I practice more effectively?",
            ],
        }
    }

    fn resources(&self) -> &'static [&'static str] {
        match self {
            ChatCategory::JavaScript | ChatCategory::React => {
                &["MDN Web Docs", "Interactive coding exercises"]
            }
            ChatCategory::Python => &["The official Python tutorial", "Practice notebooks"],
            ChatCategory::Loops => &["Loop practice exercises"],
            ChatCategory::Math => &["Worked examples", "Practice problem sets"],
            ChatCategory::Weather | ChatCategory::Cooking | ChatCategory::Help => {
                &["Course materials for your current topic"]
            }
        }
    }

    fn next_topic(&self) -> &'static str {
        match self {
            ChatCategory::JavaScript => "JavaScript functions and scope",
            ChatCategory::Python => "Python data structures",
            ChatCategory::React => "React state and props",
            ChatCategory::Loops => "Working with arrays and lists",
            ChatCategory::Math => "Algebra fundamentals",
            ChatCategory::Weather => "Calling web APIs",
            ChatCategory::Cooking => "Building a small project",
            ChatCategory::Help => "Continue with current topic",
        }
    }
}

/// First category whose keywords appear in `message`.
pub fn classify(message: &str) -> Option<ChatCategory> {
    ChatCategory::ORDER
        .into_iter()
        .find(|category| category.pattern().is_match(message))
}

fn reply_for(message: &str, category: Option<ChatCategory>) -> String {
    match category {
        Some(category) => category
            .subtopic_reply(message)
            .unwrap_or_else(|| category.general_reply())
            .to_string(),
        None => {
            let opener = GENERIC_OPENERS[stable_index(message, GENERIC_OPENERS.len())];
            format!("{}\n\n{}", opener, GENERIC_REPLY)
        }
    }
}

pub(super) fn chat(req: &Chat) -> ChatReply {
    ChatReply {
        response: reply_for(&req.message, classify(&req.message)),
    }
}

pub(super) fn conversational_turn(req: &ConversationalTurn) -> ConversationReply {
    let category = classify(&req.student_message);
    let response = reply_for(&req.student_message, category);

    match category {
        Some(category) => ConversationReply {
            response,
            response_type: if category == ChatCategory::Help {
                "guidance".to_string()
            } else {
                "explanation".to_string()
            },
            suggested_questions: to_strings(category.suggested_questions()),
            resources: to_strings(category.resources()),
            confidence_level: "medium".to_string(),
            next_topic_suggestion: category.next_topic().to_string(),
        },
        None => ConversationReply {
            response,
            response_type: "guidance".to_string(),
            suggested_questions: vec![
                "Can you tell me more about what you're working on?".to_string(),
            ],
            resources: vec!["Course materials for your current topic".to_string()],
            confidence_level: "low".to_string(),
            next_topic_suggestion: "Continue with current topic".to_string(),
        },
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const GENERIC_OPENERS: [&str; 3] = [
    "Hi there! I'm your learning assistant.",
    "Hello! Happy to help you learn.",
    "Great to see you! Let's learn something together.",
];

const GENERIC_REPLY: &str = "I can help with:\n\n\
- **Programming**: JavaScript, Python, React and more\n\
- **Mathematics**: arithmetic, algebra, geometry and calculus basics\n\
- **Study support**: breaking down hard topics step by step\n\n\
What would you like to explore today? Ask me anything.";

const JS_VARIABLES_REPLY: &str = "**JavaScript Variables Explained Simply**\n\n\
Variables are labeled boxes that hold information:\n\n\
- `let` is a box whose contents can change\n\
- `const` is a box that is sealed once filled\n\
- `var` is the older style, best avoided in new code\n\n\
```javascript\n\
let playerName = 'Alice'; // can change later\n\
const maxScore = 100;     // never changes\n\
playerName = 'Bob';       // fine\n\
// maxScore = 200;        // TypeError\n\
```\n\n\
Use `const` by default and `let` when the value must change.\n\n\
What else would you like to know about JavaScript variables?";

const JS_FUNCTIONS_REPLY: &str = "**JavaScript Functions: Reusable Recipes**\n\n\
A function packages steps you can run again by calling it:\n\n\
```javascript\n\
function makeGreeting(name) {\n\
  return 'Hello, ' + name + '!';\n\
}\n\n\
const add = (a, b) => a + b; // arrow function\n\n\
makeGreeting('Sarah'); // 'Hello, Sarah!'\n\
add(2, 3);             // 5\n\
```\n\n\
Functions let you avoid repetition and fix bugs in one place.\n\n\
Which part of functions should we explore next?";

const JS_REPLY: &str = "**JavaScript: The Language of the Web**\n\n\
JavaScript makes pages interactive in the browser, powers servers through \
Node.js and even builds mobile apps.\n\n\
Good first steps:\n\
1. Variables (storing information)\n\
2. Functions (doing tasks)\n\
3. Events (responding to clicks)\n\
4. The DOM (changing the page)\n\n\
Which of these would you like me to explain?";

const PY_LISTS_REPLY: &str = "**Python Lists: Ordered Collections**\n\n\
A list holds several items in order and can grow or shrink:\n\n\
```python\n\
fruits = ['apple', 'banana', 'orange']\n\
fruits.append('grape')     # add to the end\n\
first = fruits[0]          # 'apple'\n\
last = fruits[-1]          # 'grape'\n\
fruits.remove('banana')\n\
print(len(fruits))         # 3\n\
```\n\n\
Think of a playlist where you can add, remove and reorder songs.\n\n\
What would you like to learn about lists next?";

const PY_DICTS_REPLY: &str = "**Python Dictionaries: Labels and Values**\n\n\
A dictionary maps keys to values for fast lookup:\n\n\
```python\n\
student = {'name': 'Alice', 'age': 20}\n\
student['grade'] = 'A'        # add\n\
student['age'] = 21           # update\n\
print(student.get('email'))   # None instead of an error\n\
print('name' in student)      # True\n\
```\n\n\
Phone books and inventories are classic dictionary examples.\n\n\
Which dictionary operation should we look at more closely?";

const PYTHON_REPLY: &str = "**Python: Beginner-Friendly and Powerful**\n\n\
Python reads almost like English:\n\n\
```python\n\
if temperature > 30:\n\
    print(\"It's hot today!\")\n\
```\n\n\
It is used for web development, data science, machine learning and \
automation.\n\n\
Which area of Python interests you most?";

const REACT_COMPONENTS_REPLY: &str = "**React Components: Building Blocks**\n\n\
Components are small reusable pieces of UI that you combine into a page:\n\n\
```jsx\n\
function WelcomeCard({ name }) {\n\
  return <h2>Hello, {name}!</h2>;\n\
}\n\n\
function App() {\n\
  return <WelcomeCard name='Alice' />;\n\
}\n\
```\n\n\
Each component has one job, so it is easy to reuse and maintain.\n\n\
What would you like to know next about components?";

const REACT_HOOKS_REPLY: &str = "**React Hooks: Giving Components Memory**\n\n\
`useState` gives a component a value that survives re-renders:\n\n\
```jsx\n\
function Counter() {\n\
  const [count, setCount] = useState(0);\n\
  return <button onClick={() => setCount(count + 1)}>{count}</button>;\n\
}\n\
```\n\n\
Always update state through the setter so React knows to re-render.\n\n\
Which hook should we look at next?";

const REACT_REPLY: &str = "**React: Modern Web Apps Made Easier**\n\n\
Core ideas: components, JSX, props, state and hooks.\n\n\
A good learning path:\n\
1. Basic components\n\
2. JSX syntax\n\
3. Props and state\n\
4. Small projects\n\
5. Hooks and advanced patterns\n\n\
Where would you like to start?";

const LOOPS_REPLY: &str = "**Loops: Repeating Work Automatically**\n\n\
A loop repeats a block a set number of times or until a condition changes:\n\n\
```javascript\n\
for (let i = 1; i <= 5; i++) {\n\
  console.log('Count: ' + i);\n\
}\n\
```\n\n\
```python\n\
for fruit in ['apple', 'banana']:\n\
    print(fruit)\n\
```\n\n\
Loops are ideal for processing lists and repeating actions.\n\n\
Which kind of loop would you like to understand better?";

const MATH_REPLY: &str = "**Let's Work on Math Together**\n\n\
I can help with arithmetic, geometry, statistics, algebra and the basics of \
calculus.\n\n\
Share the problem you're working on and I'll walk through it step by step.";

const WEATHER_REPLY: &str = "I can't check live weather data, but weather websites and \
your phone's weather app have up-to-date forecasts.\n\n\
If you're curious, building a small app on a public weather API is a great \
programming project. Would you like to learn how?";

const COOKING_REPLY: &str = "I'd love to help with cooking! I can suggest recipes from the \
ingredients you have, explain techniques and help plan meals.\n\n\
What kind of dish are you thinking about?";

const HELP_REPLY: &str = "I'm here to help! I can assist with programming questions, study \
strategies, breaking down hard problems and project ideas.\n\n\
What's on your mind?";

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(message: &str) -> ConversationReply {
        conversational_turn(&ConversationalTurn {
            student_message: message.to_string(),
            conversation_history: vec![],
        })
    }

    #[test]
    fn test_javascript_variables_template() {
        let reply = turn("tell me about javascript variables");
        assert!(reply.response.starts_with("**JavaScript Variables Explained Simply**"));
        assert_eq!(reply.response_type, "explanation");
    }

    #[test]
    fn test_subtopics_are_tried_in_order() {
        // both sub-topics match; variables comes first
        let reply = turn("js functions and variables");
        assert_eq!(reply.response, JS_VARIABLES_REPLY);
    }

    #[test]
    fn test_category_order_first_match_wins() {
        assert_eq!(classify("python loops"), Some(ChatCategory::Python));
        assert_eq!(classify("react or javascript?"), Some(ChatCategory::JavaScript));
        assert_eq!(classify("help me with math"), Some(ChatCategory::Math));
    }

    #[test]
    fn test_weather_and_cooking_outrank_math() {
        assert_eq!(classify("calculate the weather"), Some(ChatCategory::Weather));
        assert_eq!(classify("math recipe"), Some(ChatCategory::Cooking));
        assert_eq!(classify("loops in the forecast"), Some(ChatCategory::Loops));
    }

    #[test]
    fn test_word_boundaries() {
        // "json" must not match js, "happy" must not match py
        assert_eq!(classify("parse json"), None);
        assert_eq!(classify("happy days"), None);
        assert_eq!(classify("I love JS"), Some(ChatCategory::JavaScript));
    }

    #[test]
    fn test_general_category_reply() {
        let reply = chat(&Chat {
            message: "What is React?".into(),
            context: None,
        });
        assert_eq!(reply.response, REACT_REPLY);
    }

    #[test]
    fn test_generic_reply_is_stable() {
        let a = chat(&Chat {
            message: "hello there".into(),
            context: None,
        });
        let b = chat(&Chat {
            message: "hello there".into(),
            context: None,
        });
        assert_eq!(a, b);
        assert!(a.response.contains("What would you like to explore today?"));
    }

    #[test]
    fn test_unmatched_turn_has_low_confidence() {
        let reply = turn("hmm");
        assert_eq!(reply.confidence_level, "low");
        assert_eq!(reply.response_type, "guidance");
    }
}
