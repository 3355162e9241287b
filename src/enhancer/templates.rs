//! Prompt templates and the Web UI page

use super::techniques::Technique;

/// XML structure template; contains the original prompt placeholder only
pub const XML_STRUCTURE_TEMPLATE: &str = r#"<instructions>
{original_prompt}
</instructions>

<context>
Provide any relevant background information that helps with understanding the task.
</context>

<examples>
<example>
<input>Sample input here</input>
<output>Expected output format</output>
</example>
</examples>

<formatting>
Please structure your response clearly and follow the examples provided.
</formatting>"#;

pub const CHAIN_OF_THOUGHT_TEMPLATE: &str = r#"<task>
{original_prompt}
</task>

<instructions>
Before providing your final answer, please think through this step-by-step inside <thinking> tags:
1. Break down the problem
2. Consider different approaches
3. Work through the solution
4. Verify your reasoning
</instructions>

<thinking>
[Your step-by-step reasoning will go here]
</thinking>

Please provide your response after showing your thinking process."#;

pub const ROLE_PROMPTING_TEMPLATE: &str = r#"<role>
You are a world-class {persona} with {years_experience} years of experience in {domain}. You are known for your {key_strengths} and have a reputation for {reputation_traits}.
</role>

<task>
{original_prompt}
</task>

<approach>
As an expert {persona}, please:
1. Apply your specialized knowledge and experience
2. Consider industry best practices and standards
3. Provide insights that only an expert would know
4. Structure your response professionally
</approach>"#;

pub const MULTISHOT_EXAMPLES_TEMPLATE: &str = r#"<task>
{original_prompt}
</task>

<examples>
<example_1>
<input>{example_input_1}</input>
<output>{example_output_1}</output>
</example_1>

<example_2>
<input>{example_input_2}</input>
<output>{example_output_2}</output>
</example_2>
</examples>

<instructions>
Following the pattern shown in the examples above, please process the actual task.
</instructions>"#;

/// Meta-prompt asking the model to critique a prompt
pub fn critique_prompt(prompt: &str) -> String {
    format!(
        r#"<task>
You are a world-class prompt engineering expert. Your task is to analyze and critique the following user-provided prompt.
Identify its weaknesses based on criteria like clarity, specificity, context, constraints, and desired output format.

**User Prompt:**
`{prompt}`

Provide your critique in a <critique> XML tag. Be specific and constructive.
</task>"#
    )
}

/// Meta-prompt asking the model to rewrite a prompt given its critique
pub fn rewrite_prompt(prompt: &str, critique: &str) -> String {
    format!(
        r#"<task>
You are a world-class prompt engineering expert. You will be given an original prompt and a critique of that prompt.
Your task is to rewrite the original prompt to be a much more effective, "best-in-class" prompt, addressing all the points in the critique.
The new prompt should be significantly more detailed and structured, incorporating principles like XML tagging, clear instructions, context, and examples where appropriate.

**Original Prompt:**
`{prompt}`

**Critique:**
{critique}

Now, provide the new, rewritten prompt inside a <rewritten_prompt> XML tag. Output only the content for the new prompt, without the XML tag itself.
</task>"#
    )
}

/// Meta-prompt asking the model to pick one technique for a prompt
pub fn strategy_selection_prompt(prompt: &str) -> String {
    let strategy_descriptions = Technique::ALL
        .iter()
        .map(|t| format!("- **{}**: {} - {}", t.key(), t.name(), t.description()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<task>
You are an expert in prompt engineering. Your task is to analyze the following user prompt and choose the single best enhancement strategy from the list provided.

**User Prompt:**
"{prompt}"

**Available Enhancement Strategies:**
{strategy_descriptions}

**Instructions:**
1. Read the user prompt carefully.
2. For simple, short prompts, a template-based approach is fine.
3. For more complex or vague prompts, `ai_rewrite` is usually the best choice.
4. Respond with ONLY the identifier of your chosen strategy (e.g., xml_structure, ai_rewrite). Do not add any other text or explanation.
</task>

Chosen strategy identifier:"#
    )
}

/// Web UI HTML page for the Prompt Enhancer
pub const ENHANCER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Advanced Prompt Enhancer (Ollama Edition)</title>
  <style>
    * {
      margin: 0;
      padding: 0;
      box-sizing: border-box;
    }

    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', 'Helvetica Neue', sans-serif;
      background: #f5f5f5;
      color: #1f2328;
      min-height: 100vh;
      display: flex;
    }

    aside {
      width: 280px;
      background: #fff;
      border-right: 1px solid #e1e4e8;
      padding: 24px 20px;
    }

    aside h2 {
      font-size: 16px;
      margin-bottom: 16px;
    }

    main {
      flex: 1;
      padding: 24px 32px;
    }

    header h1 {
      font-size: 24px;
      margin-bottom: 6px;
    }

    header p {
      color: #57606a;
      margin-bottom: 24px;
    }

    .columns {
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 24px;
    }

    .panel {
      background: #fff;
      border: 1px solid #e1e4e8;
      border-radius: 8px;
      padding: 20px;
    }

    .panel h2 {
      font-size: 18px;
      margin-bottom: 12px;
    }

    label {
      display: block;
      font-size: 13px;
      color: #57606a;
      margin-bottom: 6px;
    }

    select, input[type=text], textarea {
      width: 100%;
      border: 1px solid #d0d7de;
      border-radius: 6px;
      padding: 8px 10px;
      font-size: 14px;
      font-family: inherit;
    }

    textarea {
      height: 250px;
      resize: vertical;
    }

    button {
      width: 100%;
      margin-top: 12px;
      padding: 10px;
      border: none;
      border-radius: 6px;
      font-size: 14px;
      cursor: pointer;
      background: #e9ecef;
    }

    button.primary {
      background: #ff4b4b;
      color: #fff;
    }

    button:disabled {
      opacity: 0.6;
      cursor: wait;
    }

    .notice {
      margin-top: 12px;
      padding: 10px 12px;
      border-radius: 6px;
      font-size: 14px;
    }

    .notice.info { background: #e7f1ff; }
    .notice.warn { background: #fff4e5; }
    .notice.error { background: #ffe9e9; }

    .hidden { display: none; }

    pre {
      background: #f6f8fa;
      border-radius: 6px;
      padding: 12px;
      white-space: pre-wrap;
      word-break: break-word;
      font-size: 13px;
      margin-top: 8px;
    }

    details {
      margin-top: 12px;
    }

    h3 {
      font-size: 15px;
      margin-top: 16px;
    }
  </style>
</head>
<body>
  <aside>
    <h2>Configuration</h2>
    <div id="modelSelectWrap">
      <label for="modelSelect">Select an Ollama Model:</label>
      <select id="modelSelect"></select>
    </div>
    <div id="modelInputWrap" class="hidden">
      <label for="modelInput">Ollama Model Name</label>
      <input type="text" id="modelInput">
    </div>
    <div id="connectionWarning" class="notice warn hidden">Could not connect to Ollama. Please ensure it's running.</div>
    <div id="modelInfo" class="notice info"></div>
  </aside>

  <main>
    <header>
      <h1>Advanced Prompt Enhancer (Ollama Edition)</h1>
      <p>Let an AI agent automatically analyze, enhance, and execute your prompts using local Ollama models.</p>
    </header>

    <div class="columns">
      <section class="panel">
        <h2>Input Prompt</h2>
        <label for="promptInput">Enter your initial prompt:</label>
        <textarea id="promptInput" placeholder="Enter the prompt you want the AI agent to enhance..."></textarea>
        <button id="enhanceBtn" class="primary">Automatically Enhance Prompt</button>
      </section>

      <section class="panel">
        <h2>Enhanced Output</h2>
        <div id="status" class="notice hidden"></div>
        <div id="strategy" class="notice info hidden"></div>
        <details id="critiqueBox" class="hidden">
          <summary>View AI Critique</summary>
          <pre id="critique"></pre>
        </details>
        <div id="enhancedBox" class="hidden">
          <h3>Enhanced Prompt</h3>
          <pre id="enhanced"></pre>
          <button id="generateBtn">Generate Response</button>
        </div>
        <div id="responseBox" class="hidden">
          <h3>AI Response</h3>
          <pre id="response"></pre>
        </div>
      </section>
    </div>
  </main>

  <script>
    const $ = (id) => document.getElementById(id);
    let connected = true;

    function currentModel() {
      return connected ? $('modelSelect').value : $('modelInput').value.trim();
    }

    function showStatus(text, kind) {
      const el = $('status');
      if (!text) {
        el.classList.add('hidden');
        return;
      }
      el.textContent = text;
      el.className = 'notice ' + kind;
    }

    function updateModelInfo() {
      $('modelInfo').textContent = 'Using model: ' + (currentModel() || '(none)');
    }

    async function api(path, body) {
      const opts = body === undefined
        ? {}
        : { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(body) };
      const resp = await fetch(path, opts);
      const data = await resp.json();
      if (!resp.ok) {
        throw new Error(data.error || ('HTTP ' + resp.status));
      }
      return data;
    }

    async function loadModels() {
      const data = await api('/api/models');
      connected = data.connected && data.models.length > 0;
      if (connected) {
        const select = $('modelSelect');
        select.innerHTML = '';
        for (const name of data.models) {
          const opt = document.createElement('option');
          opt.value = name;
          opt.textContent = name;
          select.appendChild(opt);
        }
      } else {
        $('modelSelectWrap').classList.add('hidden');
        $('modelInputWrap').classList.remove('hidden');
        $('connectionWarning').classList.remove('hidden');
        $('modelInput').value = data.defaultModel;
      }
      updateModelInfo();
    }

    $('modelSelect').addEventListener('change', updateModelInfo);
    $('modelInput').addEventListener('input', updateModelInfo);

    $('enhanceBtn').addEventListener('click', async () => {
      const prompt = $('promptInput').value;
      if (!prompt.trim()) {
        showStatus('Please enter a prompt to enhance.', 'warn');
        return;
      }

      $('enhanceBtn').disabled = true;
      $('responseBox').classList.add('hidden');
      $('critiqueBox').classList.add('hidden');
      showStatus('AI agent is thinking... Choosing enhancement strategy...', 'info');

      try {
        const data = await api('/api/enhance', { prompt, model: currentModel() });
        showStatus('', '');
        $('strategy').innerHTML = '';
        const title = document.createElement('strong');
        title.textContent = 'Chosen Strategy: ' + data.name;
        const desc = document.createElement('div');
        desc.style.fontStyle = 'italic';
        desc.textContent = data.description;
        $('strategy').append(title, desc);
        $('strategy').classList.remove('hidden');

        if (data.critique) {
          $('critique').textContent = data.critique;
          $('critiqueBox').classList.remove('hidden');
        }
        $('enhanced').textContent = data.enhancedPrompt;
        $('enhancedBox').classList.remove('hidden');
      } catch (e) {
        showStatus(e.message, 'error');
      } finally {
        $('enhanceBtn').disabled = false;
      }
    });

    $('generateBtn').addEventListener('click', async () => {
      const model = currentModel();
      $('generateBtn').disabled = true;
      showStatus('Generating response from ' + model + '...', 'info');
      try {
        const data = await api('/api/generate', { prompt: $('enhanced').textContent, model });
        showStatus('', '');
        $('response').textContent = data.response;
        $('responseBox').classList.remove('hidden');
      } catch (e) {
        showStatus(e.message, 'error');
      } finally {
        $('generateBtn').disabled = false;
      }
    });

    loadModels().catch((e) => showStatus(e.message, 'error'));
  </script>
</body>
</html>"#;
