//! Built-in provider catalog.

use super::{ModelDescriptor, ProviderDescriptor};

fn model(
    id: &str,
    name: &str,
    description: &str,
    context: u32,
    max_tokens: u32,
) -> ModelDescriptor {
    ModelDescriptor::new(id, name)
        .with_description(description)
        .with_limits(context, max_tokens)
}

fn with_models(
    mut provider: ProviderDescriptor,
    models: Vec<ModelDescriptor>,
) -> ProviderDescriptor {
    provider.models = models;
    provider
}

pub(super) fn builtin_providers() -> Vec<ProviderDescriptor> {
    vec![
        with_models(
            ProviderDescriptor::hosted("openai", "OpenAI", "https://api.openai.com/v1"),
            vec![
                model("gpt-4o", "GPT-4o (Paid)", "Most capable", 128_000, 16_384),
                model("gpt-4o-mini", "GPT-4o Mini (Paid)", "Affordable", 128_000, 16_384),
                model("gpt-4-turbo", "GPT-4 Turbo (Paid)", "Fast GPT-4", 128_000, 4_096),
                model("gpt-3.5-turbo", "GPT-3.5 Turbo (Paid)", "Efficient", 16_385, 4_096),
                model("o1", "O1 (Paid)", "Reasoning model", 200_000, 100_000),
                model("o1-mini", "O1 Mini (Paid)", "Fast reasoning", 128_000, 65_536),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("anthropic", "Anthropic", "https://api.anthropic.com/v1"),
            vec![
                model(
                    "claude-3-5-sonnet-20241022",
                    "Claude 3.5 Sonnet (Paid)",
                    "Most intelligent",
                    200_000,
                    8_192,
                ),
                model(
                    "claude-3-5-haiku-20241022",
                    "Claude 3.5 Haiku (Paid)",
                    "Fast",
                    200_000,
                    8_192,
                ),
                model("claude-3-opus-20240229", "Claude 3 Opus (Paid)", "Powerful", 200_000, 4_096),
                model(
                    "claude-3-sonnet-20240229",
                    "Claude 3 Sonnet (Paid)",
                    "Balanced",
                    200_000,
                    4_096,
                ),
                model(
                    "claude-3-haiku-20240307",
                    "Claude 3 Haiku (Paid)",
                    "Compact",
                    200_000,
                    4_096,
                ),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted(
                "google",
                "Google Gemini",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            vec![
                model(
                    "gemini-2.0-flash-exp",
                    "Gemini 2.0 Flash (Free)",
                    "Latest, 15 RPM free",
                    1_000_000,
                    8_192,
                ),
                model("gemini-1.5-pro", "Gemini 1.5 Pro (Free)", "2 RPM free", 2_000_000, 8_192),
                model(
                    "gemini-1.5-flash",
                    "Gemini 1.5 Flash (Free)",
                    "15 RPM free",
                    1_000_000,
                    8_192,
                ),
                model(
                    "gemini-1.5-flash-8b",
                    "Gemini 1.5 Flash 8B (Free)",
                    "15 RPM free",
                    1_000_000,
                    8_192,
                ),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("xai", "xAI (Grok)", "https://api.x.ai/v1"),
            vec![
                model("grok-beta", "Grok Beta (Paid)", "xAI flagship", 128_000, 8_192),
                model("grok-vision-beta", "Grok Vision (Paid)", "Multimodal", 128_000, 8_192),
                model("grok-2-1212", "Grok 2 (Paid)", "Latest Grok", 128_000, 8_192),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("openrouter", "OpenRouter", "https://openrouter.ai/api/v1"),
            vec![
                model(
                    "x-ai/grok-4.1-fast:free",
                    "Grok 4.1 Fast (Free)",
                    "2M context",
                    2_000_000,
                    8_192,
                ),
                model(
                    "tngtech/deepseek-r1t2-chimera:free",
                    "DeepSeek R1T2 Chimera (Free)",
                    "671B MoE",
                    164_000,
                    8_192,
                ),
                model(
                    "kwaipilot/kat-coder-pro-v1:free",
                    "KAT-Coder-Pro V1 (Free)",
                    "Agentic coding",
                    256_000,
                    8_192,
                ),
                model(
                    "z-ai/glm-4-5-air:free",
                    "GLM 4.5 Air (Free)",
                    "Lightweight MoE",
                    131_000,
                    8_192,
                ),
                model(
                    "deepseek/deepseek-v3-0324:free",
                    "DeepSeek V3 (Free)",
                    "685B flagship",
                    164_000,
                    8_192,
                ),
                model(
                    "deepseek/r1-0528:free",
                    "DeepSeek R1 (Free)",
                    "671B reasoning",
                    164_000,
                    8_192,
                ),
                model(
                    "qwen/qwen3-coder-480b-a35b:free",
                    "Qwen3 Coder 480B (Free)",
                    "MoE coding",
                    262_000,
                    8_192,
                ),
                model("openai/gpt-4o", "GPT-4o (Paid)", "Via OpenRouter", 128_000, 16_384),
                model(
                    "anthropic/claude-3.5-sonnet",
                    "Claude 3.5 Sonnet (Paid)",
                    "Via OpenRouter",
                    200_000,
                    8_192,
                ),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("groq", "Groq", "https://api.groq.com/openai/v1"),
            vec![
                model(
                    "llama-3.3-70b-versatile",
                    "Llama 3.3 70B (Free)",
                    "Free tier",
                    128_000,
                    32_768,
                ),
                model(
                    "llama-3.1-8b-instant",
                    "Llama 3.1 8B (Free)",
                    "Ultra-fast free",
                    128_000,
                    8_192,
                ),
                model("mixtral-8x7b-32768", "Mixtral 8x7B (Free)", "Free tier", 32_768, 32_768),
                model("gemma2-9b-it", "Gemma 2 9B (Free)", "Google free", 8_192, 8_192),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("deepseek", "DeepSeek", "https://api.deepseek.com/v1"),
            vec![
                model("deepseek-chat", "DeepSeek Chat (Paid)", "General purpose", 64_000, 4_096),
                model("deepseek-coder", "DeepSeek Coder (Paid)", "Code specialist", 64_000, 4_096),
                model("deepseek-reasoner", "DeepSeek R1 (Paid)", "Reasoning", 64_000, 8_192),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("mistral", "Mistral AI", "https://api.mistral.ai/v1"),
            vec![
                model("mistral-large-latest", "Mistral Large (Paid)", "Flagship", 128_000, 8_192),
                model(
                    "mistral-small-latest",
                    "Mistral Small (Paid)",
                    "Cost-effective",
                    32_000,
                    8_192,
                ),
                model("codestral-latest", "Codestral (Paid)", "Code specialist", 32_000, 8_192),
                model("pixtral-12b-2409", "Pixtral 12B (Paid)", "Multimodal", 128_000, 8_192),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted(
                "fireworks",
                "Fireworks AI",
                "https://api.fireworks.ai/inference/v1",
            ),
            vec![
                model(
                    "accounts/fireworks/models/llama-v3p2-3b-instruct",
                    "Llama 3.2 3B (Free)",
                    "Free tier",
                    128_000,
                    8_192,
                ),
                model(
                    "accounts/fireworks/models/gemma2-9b-it",
                    "Gemma 2 9B (Free)",
                    "Free tier",
                    8_192,
                    8_192,
                ),
                model(
                    "accounts/fireworks/models/llama-v3p3-70b-instruct",
                    "Llama 3.3 70B (Paid)",
                    "Fast inference",
                    128_000,
                    8_192,
                ),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("minimax", "MiniMax", "https://api.minimax.chat/v1"),
            vec![
                model("abab6.5s-chat", "MiniMax 6.5S (Paid)", "Latest", 245_000, 8_192),
                model("abab6.5-chat", "MiniMax 6.5 (Paid)", "Balanced", 245_000, 8_192),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("moonshot", "Moonshot AI", "https://api.moonshot.cn/v1"),
            vec![
                model("moonshot-v1-8k", "Moonshot v1 8K (Paid)", "Short context", 8_192, 4_096),
                model(
                    "moonshot-v1-128k",
                    "Moonshot v1 128K (Paid)",
                    "Long context",
                    128_000,
                    4_096,
                ),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("megallm", "MegaLLM", "https://ai.megallm.io/v1"),
            vec![
                model(
                    "openai-gpt-oss-20b",
                    "OpenAI GPT-oss-20b (Paid)",
                    "Advanced reasoning",
                    128_000,
                    128_000,
                ),
                model(
                    "llama3.3-70b-instruct",
                    "Llama 3.3 70B (Paid)",
                    "Open-source LLM",
                    131_072,
                    131_072,
                ),
                model(
                    "deepseek-r1-distill-llama-70b",
                    "DeepSeek R1 Distill 70B (Paid)",
                    "Reasoning model",
                    128_000,
                    128_000,
                ),
                model("alibaba-qwen3-32b", "Qwen3 32B (Paid)", "Alibaba AI", 131_072, 16_384),
                model(
                    "openai-gpt-oss-120b",
                    "OpenAI GPT-oss-120b (Paid)",
                    "Superior reasoning",
                    128_000,
                    128_000,
                ),
                model("llama3-8b-instruct", "Llama 3.1 8B (Paid)", "Compact LLM", 8_192, 8_192),
                model(
                    "moonshotai/kimi-k2-instruct-0905",
                    "Kimi K2 (Paid)",
                    "Moonshot AI",
                    256_000,
                    56_000,
                ),
                model(
                    "deepseek-ai/deepseek-v3.1-terminus",
                    "DeepSeek V3.1 Terminus (Paid)",
                    "Advanced reasoning",
                    163_840,
                    56_000,
                ),
                model(
                    "qwen/qwen3-next-80b-a3b-instruct",
                    "Qwen3 Next 80B (Paid)",
                    "Next-gen Qwen",
                    262_144,
                    16_384,
                ),
                model(
                    "deepseek-ai/deepseek-v3.1",
                    "DeepSeek V3.1 (Paid)",
                    "Latest DeepSeek",
                    128_000,
                    16_384,
                ),
                model(
                    "mistralai/mistral-nemotron",
                    "Mistral Nemotron (Paid)",
                    "High-performance",
                    128_000,
                    16_384,
                ),
                model("minimaxai/minimax-m2", "MiniMax M2 (Paid)", "Advanced AI", 128_000, 32_000),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("agentrouter", "Agent Router", "https://agentrouter.org/v1"),
            vec![
                model("gpt-4o", "GPT-4o (Paid)", "Routed OpenAI", 128_000, 16_384),
                model("gpt-4o-mini", "GPT-4o Mini (Paid)", "Compact GPT-4o", 128_000, 16_384),
                model(
                    "claude-3-5-sonnet-20241022",
                    "Claude 3.5 Sonnet (Paid)",
                    "Routed Anthropic",
                    200_000,
                    8_192,
                ),
                model(
                    "gemini-2.0-flash-exp",
                    "Gemini 2.0 Flash (Paid)",
                    "Routed Google",
                    1_000_000,
                    8_192,
                ),
                model(
                    "llama-3.3-70b-instruct",
                    "Llama 3.3 70B (Paid)",
                    "Routed Meta",
                    128_000,
                    8_192,
                ),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted(
                "huggingface",
                "Hugging Face",
                "https://api-inference.huggingface.co/models",
            ),
            vec![
                model(
                    "mistralai/Mistral-7B-Instruct-v0.3",
                    "Mistral 7B Instruct (Free)",
                    "Serverless inference",
                    32_768,
                    2_000,
                ),
                model(
                    "HuggingFaceH4/zephyr-7b-beta",
                    "Zephyr 7B (Free)",
                    "Serverless inference",
                    8_192,
                    2_000,
                ),
            ],
        ),
        with_models(
            ProviderDescriptor::local("ollama", "Ollama (Local)", "http://localhost:11434"),
            vec![
                model("llama3.2:3b", "Llama 3.2 3B (Free)", "100% free local", 128_000, 8_192),
                model("llama3.2:1b", "Llama 3.2 1B (Free)", "100% free local", 128_000, 8_192),
                model("qwen2.5:7b", "Qwen 2.5 7B (Free)", "100% free local", 32_768, 8_192),
                model("mistral:7b", "Mistral 7B (Free)", "100% free local", 32_768, 8_192),
                model("codellama:13b", "Code Llama 13B (Free)", "100% free local", 16_384, 4_096),
            ],
        ),
        with_models(
            ProviderDescriptor::local("lmstudio", "LM Studio (Local)", "http://localhost:1234/v1"),
            vec![model("local-model", "Local Model (Free)", "100% free, any model", 32_768, 4_096)],
        ),
        with_models(
            ProviderDescriptor::hosted(
                "bedrock",
                "AWS Bedrock",
                "https://bedrock-runtime.us-east-1.amazonaws.com",
            ),
            vec![
                model(
                    "anthropic.claude-3-5-sonnet-20241022-v2:0",
                    "Claude 3.5 Sonnet (Paid)",
                    "AWS hosted",
                    200_000,
                    8_192,
                ),
                model(
                    "anthropic.claude-3-haiku-20240307-v1:0",
                    "Claude 3 Haiku (Paid)",
                    "Fast",
                    200_000,
                    4_096,
                ),
                model(
                    "meta.llama3-3-70b-instruct-v1:0",
                    "Llama 3.3 70B (Paid)",
                    "AWS hosted",
                    128_000,
                    8_192,
                ),
                model(
                    "amazon.nova-pro-v1:0",
                    "Amazon Nova Pro (Paid)",
                    "AWS native",
                    300_000,
                    5_000,
                ),
                model(
                    "amazon.nova-lite-v1:0",
                    "Amazon Nova Lite (Paid)",
                    "Fast AWS",
                    300_000,
                    5_000,
                ),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted(
                "vertexai",
                "GCP Vertex AI",
                "https://us-central1-aiplatform.googleapis.com/v1",
            ),
            vec![
                model(
                    "gemini-2.0-flash-exp",
                    "Gemini 2.0 Flash (Paid)",
                    "GCP hosted",
                    1_000_000,
                    8_192,
                ),
                model("gemini-1.5-pro", "Gemini 1.5 Pro (Paid)", "GCP hosted", 2_000_000, 8_192),
                model(
                    "claude-3-5-sonnet@20241022",
                    "Claude 3.5 Sonnet (Paid)",
                    "Via Vertex",
                    200_000,
                    8_192,
                ),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("chutes", "Chutes AI", "https://api.chutes.ai/v1"),
            vec![
                model("gpt-4o", "GPT-4o (Paid)", "Via Chutes", 128_000, 16_384),
                model(
                    "claude-3-5-sonnet",
                    "Claude 3.5 Sonnet (Paid)",
                    "Via Chutes",
                    200_000,
                    8_192,
                ),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("glama", "Glama", "https://api.glama.ai/v1"),
            vec![
                model("llama-3.3-70b", "Llama 3.3 70B (Free)", "Free tier", 128_000, 8_192),
                model("mixtral-8x7b", "Mixtral 8x7B (Free)", "Free tier", 32_768, 8_192),
            ],
        ),
        with_models(
            ProviderDescriptor::hosted("unbound", "Unbound", "https://api.unbound.ai/v1"),
            vec![model("llama-3.3-70b", "Llama 3.3 70B (Paid)", "Unbound hosted", 128_000, 8_192)],
        ),
        with_models(
            ProviderDescriptor::hosted(
                "ovhcloud",
                "OVHcloud AI Endpoints",
                "https://llama-3-3-70b-instruct.endpoints.kepler.ai.cloud.ovh.net/v1",
            ),
            vec![model(
                "Llama-3.3-70B-Instruct",
                "Llama 3.3 70B (Paid)",
                "OVH hosted",
                128_000,
                8_192,
            )],
        ),
    ]
}
