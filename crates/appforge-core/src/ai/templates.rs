//! Bundled starter templates
//!
//! Complete single-file apps used as generation starting points and as
//! the fallback document when no provider is reachable.

/// A bundled template
pub struct TemplateDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub html: &'static str,
}

/// Built-in template catalog
pub const TEMPLATES: &[TemplateDef] = &[
    TemplateDef {
        id: "counter",
        name: "Tap Counter",
        description: "A big button and a number",
        html: COUNTER_HTML,
    },
    TemplateDef {
        id: "todo",
        name: "Todo List",
        description: "Add, check off, and clear tasks",
        html: TODO_HTML,
    },
    TemplateDef {
        id: "stopwatch",
        name: "Stopwatch",
        description: "Start, stop, reset",
        html: STOPWATCH_HTML,
    },
];

/// Look up a template by id
pub fn template_by_id(id: &str) -> Option<&'static TemplateDef> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// The document served when generation is unavailable
pub fn demo_template() -> &'static TemplateDef {
    &TEMPLATES[0]
}

const COUNTER_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Tap Counter</title>
<style>
  body { font-family: system-ui, sans-serif; display: flex; flex-direction: column;
         align-items: center; justify-content: center; min-height: 100vh; margin: 0;
         background: #1a1a2e; color: #eee; }
  #count { font-size: 6rem; font-weight: 700; }
  button { font-size: 1.2rem; padding: 0.8rem 2.4rem; border: none; border-radius: 8px;
           background: #e94560; color: #fff; cursor: pointer; margin: 0.4rem; }
  button.secondary { background: #0f3460; }
</style>
</head>
<body>
<div id="count">0</div>
<div>
  <button id="tap">Tap</button>
  <button id="reset" class="secondary">Reset</button>
</div>
<script>
  let n = 0;
  const count = document.getElementById('count');
  document.getElementById('tap').addEventListener('click', () => {
    count.textContent = ++n;
  });
  document.getElementById('reset').addEventListener('click', () => {
    n = 0;
    count.textContent = n;
  });
</script>
</body>
</html>
"#;

const TODO_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Todo List</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 480px; margin: 2rem auto;
         padding: 0 1rem; background: #fafafa; color: #222; }
  form { display: flex; gap: 0.5rem; }
  input { flex: 1; padding: 0.6rem; border: 1px solid #ccc; border-radius: 6px; }
  button { padding: 0.6rem 1.2rem; border: none; border-radius: 6px;
           background: #2563eb; color: #fff; cursor: pointer; }
  li { display: flex; align-items: center; gap: 0.5rem; padding: 0.4rem 0;
       list-style: none; }
  li.done span { text-decoration: line-through; color: #999; }
  ul { padding: 0; }
</style>
</head>
<body>
<h1>Todo</h1>
<form id="form">
  <input id="input" placeholder="What needs doing?" autocomplete="off">
  <button>Add</button>
</form>
<ul id="list"></ul>
<script>
  const form = document.getElementById('form');
  const input = document.getElementById('input');
  const list = document.getElementById('list');
  form.addEventListener('submit', (e) => {
    e.preventDefault();
    const text = input.value.trim();
    if (!text) return;
    const li = document.createElement('li');
    const box = document.createElement('input');
    box.type = 'checkbox';
    box.addEventListener('change', () => li.classList.toggle('done', box.checked));
    const span = document.createElement('span');
    span.textContent = text;
    li.append(box, span);
    list.appendChild(li);
    input.value = '';
  });
</script>
</body>
</html>
"#;

const STOPWATCH_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Stopwatch</title>
<style>
  body { font-family: ui-monospace, monospace; display: flex; flex-direction: column;
         align-items: center; justify-content: center; min-height: 100vh; margin: 0;
         background: #0b132b; color: #fff; }
  #time { font-size: 4rem; letter-spacing: 0.1em; }
  button { font-size: 1rem; padding: 0.7rem 1.8rem; margin: 0.3rem; border: none;
           border-radius: 8px; background: #3a506b; color: #fff; cursor: pointer; }
</style>
</head>
<body>
<div id="time">00:00.0</div>
<div>
  <button id="toggle">Start</button>
  <button id="reset">Reset</button>
</div>
<script>
  let elapsed = 0, running = null, last = 0;
  const time = document.getElementById('time');
  const toggle = document.getElementById('toggle');
  function render() {
    const s = elapsed / 1000;
    const m = Math.floor(s / 60);
    time.textContent = String(m).padStart(2, '0') + ':' +
      (s - m * 60).toFixed(1).padStart(4, '0');
  }
  toggle.addEventListener('click', () => {
    if (running) {
      clearInterval(running);
      running = null;
      toggle.textContent = 'Start';
    } else {
      last = Date.now();
      running = setInterval(() => {
        elapsed += Date.now() - last;
        last = Date.now();
        render();
      }, 100);
      toggle.textContent = 'Stop';
    }
  });
  document.getElementById('reset').addEventListener('click', () => {
    elapsed = 0;
    render();
  });
</script>
</body>
</html>
"#;
